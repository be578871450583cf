//! TTS Context - 宿主响应模型
//!
//! 对应 core 平台的 JSON 响应。除了读取 message/reprompt 和写入音频槽位，
//! 其余字段通过 `extra` 原样保留。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::audio_result::AudioResult;
use super::segment::OutputSlot;

/// 宿主响应
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreResponse {
    #[serde(default)]
    pub output: Vec<OutputEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 单个输出条目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<MessageValue>,

    /// 平台相关输出，音频写在这里
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub platforms: BTreeMap<String, PlatformOutput>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 消息值：纯字符串或结构化消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageValue {
    Text(String),
    Structured(StructuredMessage),
}

/// 结构化消息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// SSML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 平台输出中的音频槽位
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_audio: Option<AudioResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt_audio: Option<AudioResult>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutputEntry {
    pub fn message_for(&self, slot: OutputSlot) -> Option<&MessageValue> {
        match slot {
            OutputSlot::Message => self.message.as_ref(),
            OutputSlot::Reprompt => self.reprompt.as_ref(),
        }
    }

    /// 写入音频，平台段不存在时创建
    pub fn attach_audio(&mut self, platform: &str, slot: OutputSlot, audio: AudioResult) {
        let section = self.platforms.entry(platform.to_string()).or_default();
        match slot {
            OutputSlot::Message => section.message_audio = Some(audio),
            OutputSlot::Reprompt => section.reprompt_audio = Some(audio),
        }
    }

    pub fn audio_for(&self, platform: &str, slot: OutputSlot) -> Option<&AudioResult> {
        let section = self.platforms.get(platform)?;
        match slot {
            OutputSlot::Message => section.message_audio.as_ref(),
            OutputSlot::Reprompt => section.reprompt_audio.as_ref(),
        }
    }
}

impl CoreResponse {
    /// 按位置写入音频；索引越界时忽略
    pub fn attach_audio(
        &mut self,
        entry_index: usize,
        platform: &str,
        slot: OutputSlot,
        audio: AudioResult,
    ) -> bool {
        match self.output.get_mut(entry_index) {
            Some(entry) => {
                entry.attach_audio(platform, slot, audio);
                true
            }
            None => false,
        }
    }
}
