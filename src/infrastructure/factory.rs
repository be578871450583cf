//! Backend Factory
//!
//! 根据配置选择并构造合成后端与缓存后端

use std::sync::Arc;

use crate::application::{ApplicationError, SpeechSynthesizerPort, TtsCachePort};
use crate::config::{AppConfig, CacheBackend, SynthesisBackend};
use crate::infrastructure::adapters::{
    FakeTtsClient, FakeTtsClientConfig, FileTtsCache, FileTtsCacheConfig, HttpTtsClient,
    HttpTtsClientConfig,
};
use crate::infrastructure::memory::InMemoryTtsCache;
use crate::infrastructure::persistence::sled::{SledCacheConfig, SledTtsCache};

/// 构造合成后端
pub fn build_synthesizer(
    config: &AppConfig,
) -> Result<Arc<dyn SpeechSynthesizerPort>, ApplicationError> {
    let synthesis = &config.synthesis;

    match synthesis.backend {
        SynthesisBackend::Http => {
            let client = HttpTtsClient::new(HttpTtsClientConfig {
                base_url: synthesis.url.clone(),
                api_key: synthesis.api_key.clone(),
                timeout_secs: synthesis.timeout_secs,
                output_format: config.tts.output_format.clone(),
                voice_id: synthesis.voice_id.clone(),
                engine: synthesis.engine.clone(),
                sample_rate: synthesis.sample_rate.clone(),
                language_code: synthesis.language_code.clone(),
                lexicon_names: synthesis.lexicon_names.clone(),
                speech_mark_types: synthesis.speech_mark_types.clone(),
            })?;
            Ok(Arc::new(client))
        }
        SynthesisBackend::Fake => {
            let client = FakeTtsClient::new(FakeTtsClientConfig {
                audio_file_path: synthesis.fake_audio_path.clone(),
                content_type: synthesis.fake_content_type.clone(),
                output_format: config.tts.output_format.clone(),
                voice_id: Some(synthesis.voice_id.clone()),
            })?;
            Ok(Arc::new(client))
        }
    }
}

/// 构造缓存后端
///
/// backend = none 时返回 None，编排器将每次都调用合成服务
pub async fn build_cache(
    config: &AppConfig,
) -> Result<Option<Arc<dyn TtsCachePort>>, ApplicationError> {
    let cache = &config.cache;

    let port: Arc<dyn TtsCachePort> = match cache.backend {
        CacheBackend::None => {
            tracing::info!("TTS cache disabled");
            return Ok(None);
        }
        CacheBackend::File => {
            let file_cache = FileTtsCache::new(FileTtsCacheConfig {
                root_dir: cache.root_dir.clone(),
                path: cache.path.clone(),
                base_url: config.cache_base_url(),
                return_raw_audio: cache.return_raw_audio,
            })
            .await?;
            Arc::new(file_cache)
        }
        CacheBackend::Sled => {
            if let Some(parent) = std::path::Path::new(&cache.sled_path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ApplicationError::StorageError(e.to_string()))?;
            }
            let sled_cache = SledTtsCache::new(SledCacheConfig {
                db_path: cache.sled_path.clone(),
                max_size_bytes: cache.max_size_bytes,
                path: cache.path.clone(),
                base_url: cache.base_url.clone(),
                return_raw_audio: cache.return_raw_audio,
            })?;
            Arc::new(sled_cache)
        }
        CacheBackend::Memory => {
            let mut memory = InMemoryTtsCache::new(cache.return_raw_audio);
            if let Some(base_url) = &cache.base_url {
                memory = memory.with_base_url(base_url.clone());
            }
            Arc::new(memory)
        }
    };

    tracing::info!(backend = port.backend_type(), "TTS cache ready");

    Ok(Some(port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fake_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.synthesis.backend = SynthesisBackend::Fake;
        config
    }

    #[tokio::test]
    async fn test_build_fake_synthesizer() {
        let config = fake_config();
        let synthesizer = build_synthesizer(&config).unwrap();
        assert_eq!(synthesizer.key_prefix().as_deref(), Some("Matthew"));
    }

    #[tokio::test]
    async fn test_build_http_synthesizer_requires_voice() {
        let mut config = AppConfig::default();
        config.synthesis.voice_id = String::new();

        let result = build_synthesizer(&config);
        assert!(matches!(result, Err(ApplicationError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn test_build_cache_none() {
        let mut config = fake_config();
        config.cache.backend = CacheBackend::None;
        assert!(build_cache(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_build_cache_backends() {
        let dir = tempdir().unwrap();

        let mut config = fake_config();
        config.cache.backend = CacheBackend::Memory;
        let cache = build_cache(&config).await.unwrap().unwrap();
        assert_eq!(cache.backend_type(), "memory");

        config.cache.backend = CacheBackend::File;
        config.cache.root_dir = dir.path().join("files");
        let cache = build_cache(&config).await.unwrap().unwrap();
        assert_eq!(cache.backend_type(), "file");
        assert!(dir.path().join("files").is_dir());

        config.cache.backend = CacheBackend::Sled;
        config.cache.sled_path = dir
            .path()
            .join("db/cache.sled")
            .to_string_lossy()
            .to_string();
        let cache = build_cache(&config).await.unwrap().unwrap();
        assert_eq!(cache.backend_type(), "sled");
    }
}
