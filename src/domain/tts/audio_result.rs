//! TTS Context - Value Objects

use serde::{Deserialize, Serialize};

/// 文本类型
///
/// 线上格式沿用 TTS 服务的约定: `text` / `ssml`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextType {
    #[serde(rename = "text")]
    Plain,
    #[serde(rename = "ssml")]
    Markup,
}

impl TextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "text",
            Self::Markup => "ssml",
        }
    }
}

impl std::fmt::Display for TextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 合成（或缓存命中）得到的音频描述
///
/// `url` 与 `raw_audio_base64` 至少应有一个才可播放，但两者都允许缺失
/// （例如缓存只返回了元数据）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,

    /// 外部存储的公开地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Base64 编码的原始音频
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_audio_base64: Option<String>,
}

impl AudioResult {
    pub fn has_raw_audio(&self) -> bool {
        self.raw_audio_base64
            .as_deref()
            .is_some_and(|audio| !audio.is_empty())
    }

    /// 去掉内联音频
    pub fn strip_raw_audio(&mut self) {
        self.raw_audio_base64 = None;
    }
}

/// 根据输出格式推断 Content-Type
pub fn content_type_for_format(output_format: &str) -> &'static str {
    match output_format.to_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "ogg_vorbis" | "ogg" => "audio/ogg",
        "pcm" => "audio/pcm",
        "wav" => "audio/wav",
        "json" => "application/x-json-stream",
        _ => "application/octet-stream",
    }
}
