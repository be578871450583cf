//! Sled-based LRU TTS Cache Implementation
//!
//! 元数据与音频分开存储（`meta:` / `audio:` 前缀），只做存在性检查时不读音频。

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::ports::{CacheError, TtsCachePort};
use crate::domain::tts::{build_storage_path, join_url, AudioResult};

const META_PREFIX: &str = "meta:";
const AUDIO_PREFIX: &str = "audio:";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
    /// 最大缓存大小（字节）
    pub max_size_bytes: u64,
    /// 条目路径前缀
    pub path: String,
    /// 如果音频另有公开地址，用它生成 url
    pub base_url: Option<String>,
    /// get 时是否读取音频本体
    pub return_raw_audio: bool,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/tts-cache.sled".to_string(),
            max_size_bytes: 1024 * 1024 * 1024, // 1GB
            path: String::new(),
            base_url: None,
            return_raw_audio: true,
        }
    }
}

/// 内部元数据条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    content_type: Option<String>,
    size_bytes: u64,
    last_accessed: i64,
    created_at: i64,
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// Sled TTS 缓存
pub struct SledTtsCache {
    db: Db,
    config: SledCacheConfig,
    current_size: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledTtsCache {
    /// 创建新的缓存实例
    pub fn new(config: SledCacheConfig) -> Result<Self, CacheError> {
        if config.db_path.trim().is_empty() {
            return Err(CacheError::Configuration(
                "sled db_path is required".to_string(),
            ));
        }
        if config.max_size_bytes == 0 {
            return Err(CacheError::Configuration(
                "sled max_size_bytes must be greater than 0".to_string(),
            ));
        }

        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        // 计算当前缓存大小
        let current_size = Self::calculate_total_size(&db)?;

        tracing::info!(
            db_path = %config.db_path,
            max_size_bytes = config.max_size_bytes,
            current_size = current_size,
            "SledTtsCache initialized"
        );

        Ok(Self {
            db,
            config,
            current_size: AtomicU64::new(current_size),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    /// 打开现有缓存
    pub fn open<P: AsRef<Path>>(path: P, max_size_bytes: u64) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            max_size_bytes,
            ..Default::default()
        };
        Self::new(config)
    }

    /// 计算数据库中所有条目的总大小
    fn calculate_total_size(db: &Db) -> Result<u64, CacheError> {
        let mut total = 0u64;
        for item in db.scan_prefix(META_PREFIX) {
            let (_, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(meta) = bincode::deserialize::<EntryMeta>(&value) {
                total += meta.size_bytes;
            }
        }
        Ok(total)
    }

    fn read_meta(&self, storage_path: &str) -> Result<Option<EntryMeta>, CacheError> {
        match self.db.get(format!("{}{}", META_PREFIX, storage_path)) {
            Ok(Some(data)) => bincode::deserialize(&data)
                .map(Some)
                .map_err(|e| CacheError::SerializationError(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    fn write_meta(&self, storage_path: &str, meta: &EntryMeta) -> Result<(), CacheError> {
        let bytes =
            bincode::serialize(meta).map_err(|e| CacheError::SerializationError(e.to_string()))?;
        self.db
            .insert(format!("{}{}", META_PREFIX, storage_path), bytes)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// 删除条目，返回释放的字节数
    fn remove_entry(&self, storage_path: &str) -> Result<u64, CacheError> {
        let removed = self
            .db
            .remove(format!("{}{}", META_PREFIX, storage_path))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        let _ = self.db.remove(format!("{}{}", AUDIO_PREFIX, storage_path));

        let freed = removed
            .and_then(|data| bincode::deserialize::<EntryMeta>(&data).ok())
            .map_or(0, |meta| meta.size_bytes);
        self.current_size.fetch_sub(
            freed.min(self.current_size.load(Ordering::Relaxed)),
            Ordering::Relaxed,
        );
        Ok(freed)
    }

    /// LRU 淘汰，缓存为空时返回 false
    fn evict_lru(&self) -> Result<bool, CacheError> {
        let mut oldest: Option<(String, EntryMeta)> = None;

        for item in self.db.scan_prefix(META_PREFIX) {
            let (key, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(meta) = bincode::deserialize::<EntryMeta>(&value) {
                let is_older = oldest
                    .as_ref()
                    .map(|(_, m)| meta.last_accessed < m.last_accessed)
                    .unwrap_or(true);

                if is_older {
                    let key_str = String::from_utf8(key.to_vec())
                        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                    oldest = Some((key_str, meta));
                }
            }
        }

        let Some((key, meta)) = oldest else {
            return Ok(false);
        };

        let storage_path = key.trim_start_matches(META_PREFIX);
        self.remove_entry(storage_path)?;

        tracing::debug!(
            path = %storage_path,
            size_bytes = meta.size_bytes,
            "LRU evicted TTS cache entry"
        );

        Ok(true)
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.db.scan_prefix(META_PREFIX).count(),
            total_size_bytes: self.current_size.load(Ordering::Relaxed),
            max_size_bytes: self.config.max_size_bytes,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TtsCachePort for SledTtsCache {
    async fn get(
        &self,
        key: &str,
        locale: &str,
        output_format: &str,
    ) -> Result<Option<AudioResult>, CacheError> {
        let storage_path = build_storage_path(&self.config.path, locale, key, Some(output_format));

        let Some(mut meta) = self.read_meta(&storage_path)? else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        let mut result = AudioResult {
            content_type: meta.content_type.clone(),
            file_extension: Some(output_format.to_string()),
            url: self.public_url(key, locale, Some(output_format)),
            ..Default::default()
        };

        if self.config.return_raw_audio {
            let audio = self
                .db
                .get(format!("{}{}", AUDIO_PREFIX, storage_path))
                .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            match audio {
                Some(audio) => {
                    result.raw_audio_base64 =
                        Some(base64::engine::general_purpose::STANDARD.encode(&audio));
                }
                None => {
                    // 元数据残留但音频丢失，按未命中处理
                    self.remove_entry(&storage_path)?;
                    self.miss_count.fetch_add(1, Ordering::Relaxed);
                    return Ok(None);
                }
            }
        }

        // 更新 last_accessed (LRU touch)
        meta.last_accessed = Utc::now().timestamp();
        self.write_meta(&storage_path, &meta)?;

        self.hit_count.fetch_add(1, Ordering::Relaxed);
        Ok(Some(result))
    }

    async fn store(&self, key: &str, locale: &str, data: &AudioResult) -> Result<(), CacheError> {
        let encoded = match data.raw_audio_base64.as_deref() {
            Some(encoded) if !encoded.is_empty() => encoded,
            _ => return Ok(()),
        };

        let audio = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| CacheError::InvalidPayload(e.to_string()))?;
        let size = audio.len() as u64;

        if size > self.config.max_size_bytes {
            tracing::warn!(
                size_bytes = size,
                max_size_bytes = self.config.max_size_bytes,
                "Audio larger than cache, not stored"
            );
            return Ok(());
        }

        let storage_path =
            build_storage_path(&self.config.path, locale, key, data.file_extension.as_deref());

        // 覆盖写：先移除旧条目，保证大小统计准确
        self.remove_entry(&storage_path)?;

        // 淘汰以腾出空间
        while self.current_size.load(Ordering::Relaxed) + size > self.config.max_size_bytes {
            if !self.evict_lru()? {
                break;
            }
        }

        self.db
            .insert(format!("{}{}", AUDIO_PREFIX, storage_path), audio)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        let now = Utc::now().timestamp();
        self.write_meta(
            &storage_path,
            &EntryMeta {
                content_type: data.content_type.clone(),
                size_bytes: size,
                last_accessed: now,
                created_at: now,
            },
        )?;

        self.current_size.fetch_add(size, Ordering::Relaxed);

        tracing::debug!(
            path = %storage_path,
            size_bytes = size,
            "Audio cached"
        );

        Ok(())
    }

    fn public_url(&self, key: &str, locale: &str, extension: Option<&str>) -> Option<String> {
        let base_url = self.config.base_url.as_deref()?;
        let storage_path = build_storage_path(&self.config.path, locale, key, extension);
        Some(join_url(base_url, &storage_path))
    }

    fn backend_type(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &Path, max_size_bytes: u64, return_raw_audio: bool) -> SledCacheConfig {
        SledCacheConfig {
            db_path: dir.join("test.sled").to_string_lossy().to_string(),
            max_size_bytes,
            path: "tts".to_string(),
            base_url: None,
            return_raw_audio,
        }
    }

    fn audio(encoded: &str) -> AudioResult {
        AudioResult {
            content_type: Some("audio/mpeg".to_string()),
            file_extension: Some("mp3".to_string()),
            raw_audio_base64: Some(encoded.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cache_store_get() {
        let dir = tempdir().unwrap();
        let cache = SledTtsCache::new(config(dir.path(), 1024 * 1024, true)).unwrap();

        cache.store("Matthew-abc", "en-US", &audio("AAECAw==")).await.unwrap();

        let result = cache.get("Matthew-abc", "en-US", "mp3").await.unwrap().unwrap();
        assert_eq!(result.content_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(result.raw_audio_base64.as_deref(), Some("AAECAw=="));
        assert!(result.url.is_none());

        // Miss
        assert!(cache.get("Matthew-abc", "fr-FR", "mp3").await.unwrap().is_none());

        // Stats
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_size_bytes, 4);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[tokio::test]
    async fn test_existence_check_returns_url_only() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path(), 1024 * 1024, false);
        config.base_url = Some("http://localhost:5060/audio".to_string());
        let cache = SledTtsCache::new(config).unwrap();

        cache.store("k", "en-US", &audio("AAECAw==")).await.unwrap();

        let result = cache.get("k", "en-US", "mp3").await.unwrap().unwrap();
        assert!(result.raw_audio_base64.is_none());
        assert_eq!(
            result.url.as_deref(),
            Some("http://localhost:5060/audio/tts/en-US/k.mp3")
        );
    }

    #[tokio::test]
    async fn test_overwrite_keeps_size_accurate() {
        let dir = tempdir().unwrap();
        let cache = SledTtsCache::new(config(dir.path(), 1024, true)).unwrap();

        cache.store("k", "en-US", &audio("AAECAw==")).await.unwrap();
        cache.store("k", "en-US", &audio("AAECAw==")).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_size_bytes, 4);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let dir = tempdir().unwrap();
        // 只容得下两个 4 字节条目
        let cache = SledTtsCache::new(config(dir.path(), 8, true)).unwrap();

        cache.store("a", "en-US", &audio("AAECAw==")).await.unwrap();
        cache.store("b", "en-US", &audio("AAECAw==")).await.unwrap();
        cache.store("c", "en-US", &audio("AAECAw==")).await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert!(stats.total_size_bytes <= 8);
        assert!(cache.get("c", "en-US", "mp3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_without_bytes_is_noop() {
        let dir = tempdir().unwrap();
        let cache = SledTtsCache::new(config(dir.path(), 1024, true)).unwrap();

        let mut data = audio("AAECAw==");
        data.raw_audio_base64 = None;
        cache.store("k", "en-US", &data).await.unwrap();

        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_reopen_recalculates_size() {
        let dir = tempdir().unwrap();
        {
            let cache = SledTtsCache::new(config(dir.path(), 1024, true)).unwrap();
            cache.store("k", "en-US", &audio("AAECAw==")).await.unwrap();
            cache.flush().unwrap();
        }

        let cache = SledTtsCache::open(dir.path().join("test.sled"), 1024).unwrap();
        assert_eq!(cache.stats().total_size_bytes, 4);
    }

    #[test]
    fn test_zero_budget_is_configuration_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            SledTtsCache::new(config(dir.path(), 0, true)),
            Err(CacheError::Configuration(_))
        ));
    }
}
