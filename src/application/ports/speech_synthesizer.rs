//! Speech Synthesizer Port - TTS 合成引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::tts::{AudioResult, TextType};

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Invalid synthesizer configuration: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Speech Synthesizer Port
///
/// 把 (text, text_type) 转成音频。没有音频流时返回 `Ok(None)`。
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// 合成语音
    ///
    /// 成功时返回 `{content_type, text, file_extension, raw_audio_base64}`
    async fn synthesize(
        &self,
        text: &str,
        text_type: TextType,
    ) -> Result<Option<AudioResult>, TtsError>;

    /// 缓存 key 前缀（区分音色配置），与后端无关时为 None
    fn key_prefix(&self) -> Option<String>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
