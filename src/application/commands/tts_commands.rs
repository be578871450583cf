//! TTS Commands - 响应语音合成命令

use crate::application::orchestrator::TtsReport;
use crate::domain::tts::CoreResponse;

/// 为响应生成语音
#[derive(Debug, Clone)]
pub struct ProcessResponseCommand {
    /// 请求声明的 locale
    pub locale: Option<String>,
    pub response: CoreResponse,
}

/// 处理结果
#[derive(Debug, Clone)]
pub struct ProcessResponseResult {
    pub response: CoreResponse,
    pub report: TtsReport,
}
