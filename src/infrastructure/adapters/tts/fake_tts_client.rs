//! Fake TTS Client - 离线开发用的 TTS 客户端
//!
//! 不调用任何服务：配置了音频文件时始终返回该文件，否则返回文本本身的字节

use async_trait::async_trait;
use base64::Engine;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::ports::{SpeechSynthesizerPort, TtsError};
use crate::domain::tts::{AudioResult, TextType};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 固定返回的音频文件路径
    pub audio_file_path: Option<PathBuf>,
    pub content_type: String,
    pub output_format: String,
    /// 缓存 key 前缀
    pub voice_id: Option<String>,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            audio_file_path: None,
            content_type: "audio/mpeg".to_string(),
            output_format: "mp3".to_string(),
            voice_id: Some("fake".to_string()),
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    /// 预加载的音频数据
    audio_data: Option<Vec<u8>>,
    calls: AtomicU64,
}

impl FakeTtsClient {
    /// 创建新的 FakeTtsClient，音频文件在这里一次性读入
    pub fn new(config: FakeTtsClientConfig) -> Result<Self, TtsError> {
        let audio_data = match &config.audio_file_path {
            Some(path) => Some(std::fs::read(path).map_err(|e| {
                TtsError::Configuration(format!(
                    "Cannot read fake audio file {}: {}",
                    path.display(),
                    e
                ))
            })?),
            None => None,
        };

        tracing::info!(
            path = ?config.audio_file_path,
            content_type = %config.content_type,
            "FakeTtsClient initialized"
        );

        Ok(Self {
            config,
            audio_data,
            calls: AtomicU64::new(0),
        })
    }

    /// 已处理的合成请求数
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SpeechSynthesizerPort for FakeTtsClient {
    async fn synthesize(
        &self,
        text: &str,
        text_type: TextType,
    ) -> Result<Option<AudioResult>, TtsError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            text_len = text.len(),
            text_type = %text_type,
            "FakeTtsClient: returning fixed audio"
        );

        let audio = match &self.audio_data {
            Some(data) => data.as_slice(),
            None => text.as_bytes(),
        };

        Ok(Some(AudioResult {
            content_type: Some(self.config.content_type.clone()),
            text: Some(text.to_string()),
            file_extension: Some(self.config.output_format.clone()),
            raw_audio_base64: Some(base64::engine::general_purpose::STANDARD.encode(audio)),
            ..Default::default()
        }))
    }

    fn key_prefix(&self) -> Option<String> {
        self.config.voice_id.clone()
    }
}
