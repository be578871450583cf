//! In-Memory TTS Cache Implementation
//!
//! 进程内缓存，重启即丢失。用于开发环境和测试。

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::{CacheError, TtsCachePort};
use crate::domain::tts::{build_storage_path, join_url, AudioResult};

#[derive(Debug, Clone)]
struct StoredAudio {
    content_type: Option<String>,
    raw_audio_base64: String,
}

/// 内存 TTS 缓存
pub struct InMemoryTtsCache {
    entries: DashMap<String, StoredAudio>,
    return_raw_audio: bool,
    base_url: Option<String>,
}

impl InMemoryTtsCache {
    pub fn new(return_raw_audio: bool) -> Self {
        Self {
            entries: DashMap::new(),
            return_raw_audio,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryTtsCache {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl TtsCachePort for InMemoryTtsCache {
    async fn get(
        &self,
        key: &str,
        locale: &str,
        output_format: &str,
    ) -> Result<Option<AudioResult>, CacheError> {
        let path = build_storage_path("", locale, key, Some(output_format));

        Ok(self.entries.get(&path).map(|stored| AudioResult {
            content_type: stored.content_type.clone(),
            file_extension: Some(output_format.to_string()),
            url: self.public_url(key, locale, Some(output_format)),
            raw_audio_base64: self
                .return_raw_audio
                .then(|| stored.raw_audio_base64.clone()),
            ..Default::default()
        }))
    }

    async fn store(&self, key: &str, locale: &str, data: &AudioResult) -> Result<(), CacheError> {
        let Some(encoded) = data.raw_audio_base64.as_ref().filter(|a| !a.is_empty()) else {
            return Ok(());
        };

        let path = build_storage_path("", locale, key, data.file_extension.as_deref());
        self.entries.insert(
            path,
            StoredAudio {
                content_type: data.content_type.clone(),
                raw_audio_base64: encoded.clone(),
            },
        );
        Ok(())
    }

    fn public_url(&self, key: &str, locale: &str, extension: Option<&str>) -> Option<String> {
        let base_url = self.base_url.as_deref()?;
        Some(join_url(base_url, &build_storage_path("", locale, key, extension)))
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
