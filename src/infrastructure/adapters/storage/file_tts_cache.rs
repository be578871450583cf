//! File TTS Cache - 对象存储风格的文件系统音频缓存
//!
//! 实现 TtsCachePort trait。`root_dir` 相当于 bucket，对象路径为
//! `{path}/{locale}/{key}.{extension}`，由 HTTP 层以静态文件方式公开。
//! 每个对象旁边有一个 `.meta.json` 记录 Content-Type。

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{CacheError, TtsCachePort};
use crate::domain::tts::{build_storage_path, content_type_for_format, join_url, AudioResult};

const META_SUFFIX: &str = ".meta.json";

/// 文件缓存配置
#[derive(Debug, Clone)]
pub struct FileTtsCacheConfig {
    /// 存储根目录（bucket）
    pub root_dir: PathBuf,
    /// 根目录下的路径前缀
    pub path: String,
    /// 公开访问的 Base URL
    pub base_url: String,
    /// get 时是否读取音频本体
    pub return_raw_audio: bool,
}

impl Default for FileTtsCacheConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("data/tts"),
            path: "polly-tts/audio".to_string(),
            base_url: "http://localhost:5060/audio".to_string(),
            return_raw_audio: false,
        }
    }
}

/// 对象元数据
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    content_type: Option<String>,
    size_bytes: u64,
    created_at: i64,
}

/// 文件系统 TTS 缓存
pub struct FileTtsCache {
    config: FileTtsCacheConfig,
}

impl FileTtsCache {
    /// 创建新的文件缓存
    ///
    /// root_dir / base_url 缺失时返回配置错误
    pub async fn new(config: FileTtsCacheConfig) -> Result<Self, CacheError> {
        if config.root_dir.as_os_str().is_empty() {
            return Err(CacheError::Configuration(
                "cache root_dir is required".to_string(),
            ));
        }
        if config.base_url.trim().is_empty() {
            return Err(CacheError::Configuration(
                "cache base_url is required".to_string(),
            ));
        }

        // 确保目录存在
        fs::create_dir_all(&config.root_dir)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;

        tracing::info!(
            root_dir = %config.root_dir.display(),
            path = %config.path,
            base_url = %config.base_url,
            return_raw_audio = config.return_raw_audio,
            "FileTtsCache initialized"
        );

        Ok(Self { config })
    }

    fn object_path(&self, storage_path: &str) -> PathBuf {
        self.config.root_dir.join(storage_path)
    }

    fn meta_path(object_path: &Path) -> PathBuf {
        let mut name = object_path.as_os_str().to_owned();
        name.push(META_SUFFIX);
        PathBuf::from(name)
    }

    async fn read_meta(object_path: &Path) -> Option<ObjectMeta> {
        let data = fs::read(Self::meta_path(object_path)).await.ok()?;
        serde_json::from_slice(&data).ok()
    }

    /// 写到临时文件再 rename，并发写同一个 key 时不会读到半个文件
    async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(format!(".{}.tmp", std::process::id()));
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, data)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| CacheError::IoError(e.to_string()))
    }
}

#[async_trait]
impl TtsCachePort for FileTtsCache {
    async fn get(
        &self,
        key: &str,
        locale: &str,
        output_format: &str,
    ) -> Result<Option<AudioResult>, CacheError> {
        let storage_path = build_storage_path(&self.config.path, locale, key, Some(output_format));
        let object_path = self.object_path(&storage_path);

        match fs::metadata(&object_path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::IoError(e.to_string())),
        }

        let content_type = Self::read_meta(&object_path)
            .await
            .and_then(|meta| meta.content_type)
            .unwrap_or_else(|| content_type_for_format(output_format).to_string());

        let mut result = AudioResult {
            content_type: Some(content_type),
            file_extension: Some(output_format.to_string()),
            url: Some(join_url(&self.config.base_url, &storage_path)),
            ..Default::default()
        };

        if self.config.return_raw_audio {
            let data = match fs::read(&object_path).await {
                Ok(data) => data,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(CacheError::IoError(e.to_string())),
            };
            result.raw_audio_base64 = Some(base64::engine::general_purpose::STANDARD.encode(data));
        }

        tracing::debug!(path = %storage_path, "FileTtsCache hit");

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

        let storage_path =
            build_storage_path(&self.config.path, locale, key, data.file_extension.as_deref());
        let object_path = self.object_path(&storage_path);

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::IoError(e.to_string()))?;
        }

        Self::write_atomic(&object_path, &audio).await?;

        let meta = ObjectMeta {
            content_type: data.content_type.clone(),
            size_bytes: audio.len() as u64,
            created_at: Utc::now().timestamp(),
        };
        let meta_bytes =
            serde_json::to_vec(&meta).map_err(|e| CacheError::SerializationError(e.to_string()))?;
        Self::write_atomic(&Self::meta_path(&object_path), &meta_bytes).await?;

        tracing::debug!(
            path = %storage_path,
            size_bytes = audio.len(),
            "Audio stored"
        );

        Ok(())
    }

    fn public_url(&self, key: &str, locale: &str, extension: Option<&str>) -> Option<String> {
        let storage_path = build_storage_path(&self.config.path, locale, key, extension);
        Some(join_url(&self.config.base_url, &storage_path))
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(root: &Path, return_raw_audio: bool) -> FileTtsCacheConfig {
        FileTtsCacheConfig {
            root_dir: root.to_path_buf(),
            path: "polly-tts/audio".to_string(),
            base_url: "https://cdn.example.com/".to_string(),
            return_raw_audio,
        }
    }

    fn audio() -> AudioResult {
        AudioResult {
            key: Some("Matthew-abc".to_string()),
            content_type: Some("audio/mpeg".to_string()),
            file_extension: Some("mp3".to_string()),
            raw_audio_base64: Some("AAECAw==".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_store_then_get_with_bytes() {
        let dir = tempdir().unwrap();
        let cache = FileTtsCache::new(config(dir.path(), true)).await.unwrap();

        cache.store("Matthew-abc", "en-US", &audio()).await.unwrap();

        let object = dir.path().join("polly-tts/audio/en-US/Matthew-abc.mp3");
        assert_eq!(std::fs::read(&object).unwrap(), vec![0, 1, 2, 3]);

        let result = cache.get("Matthew-abc", "en-US", "mp3").await.unwrap().unwrap();
        assert_eq!(result.content_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(result.raw_audio_base64.as_deref(), Some("AAECAw=="));
        assert_eq!(
            result.url.as_deref(),
            Some("https://cdn.example.com/polly-tts/audio/en-US/Matthew-abc.mp3")
        );
    }

    #[tokio::test]
    async fn test_get_without_bytes_is_existence_check() {
        let dir = tempdir().unwrap();
        let cache = FileTtsCache::new(config(dir.path(), false)).await.unwrap();
        cache.store("Matthew-abc", "en-US", &audio()).await.unwrap();

        let result = cache.get("Matthew-abc", "en-US", "mp3").await.unwrap().unwrap();
        assert_eq!(result.content_type.as_deref(), Some("audio/mpeg"));
        assert!(result.raw_audio_base64.is_none());
        assert!(result.url.is_some());
    }

    #[tokio::test]
    async fn test_miss_on_other_locale_or_format() {
        let dir = tempdir().unwrap();
        let cache = FileTtsCache::new(config(dir.path(), true)).await.unwrap();
        cache.store("Matthew-abc", "en-US", &audio()).await.unwrap();

        assert!(cache.get("Matthew-abc", "de-DE", "mp3").await.unwrap().is_none());
        assert!(cache.get("Matthew-abc", "en-US", "ogg_vorbis").await.unwrap().is_none());
        assert!(cache.get("Joanna-abc", "en-US", "mp3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_without_bytes_is_noop() {
        let dir = tempdir().unwrap();
        let cache = FileTtsCache::new(config(dir.path(), true)).await.unwrap();

        let mut data = audio();
        data.raw_audio_base64 = None;
        cache.store("Matthew-abc", "en-US", &data).await.unwrap();

        assert!(!dir.path().join("polly-tts").exists());
    }

    #[tokio::test]
    async fn test_store_rejects_invalid_base64() {
        let dir = tempdir().unwrap();
        let cache = FileTtsCache::new(config(dir.path(), true)).await.unwrap();

        let mut data = audio();
        data.raw_audio_base64 = Some("not base64!".to_string());
        let err = cache.store("Matthew-abc", "en-US", &data).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_public_url() {
        let dir = tempdir().unwrap();
        let cache = FileTtsCache::new(config(dir.path(), false)).await.unwrap();

        assert_eq!(
            cache.public_url("k", "en-US", Some("mp3")).as_deref(),
            Some("https://cdn.example.com/polly-tts/audio/en-US/k.mp3")
        );
    }

    #[tokio::test]
    async fn test_missing_base_url_fails_fast() {
        let dir = tempdir().unwrap();
        let mut config = config(dir.path(), false);
        config.base_url = String::new();

        assert!(matches!(
            FileTtsCache::new(config).await,
            Err(CacheError::Configuration(_))
        ));
    }
}
