//! 可朗读片段提取

use super::audio_result::TextType;
use super::response::{CoreResponse, MessageValue};

/// 片段在输出条目中的槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputSlot {
    Message,
    Reprompt,
}

impl OutputSlot {
    pub const ALL: [OutputSlot; 2] = [OutputSlot::Message, OutputSlot::Reprompt];

    /// 平台输出中的字段名
    pub fn audio_field(&self) -> &'static str {
        match self {
            Self::Message => "messageAudio",
            Self::Reprompt => "repromptAudio",
        }
    }
}

/// 一次处理过程中的可朗读片段，不持久化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub entry_index: usize,
    pub slot: OutputSlot,
    pub text: String,
    pub text_type: TextType,
    pub locale: String,
}

/// 解析消息文本
///
/// 依次检查纯字符串、结构化 `text`、结构化 `speech`，第一个非空值胜出；
/// 只有命中 `speech` 时才是 SSML。
/// 同时有 `text` 和 `speech` 时固定用 `text`，不要改成 `speech` 覆盖 `text`。
pub fn resolve_text(message: &MessageValue) -> Option<(String, TextType)> {
    match message {
        MessageValue::Text(text) if !text.is_empty() => Some((text.clone(), TextType::Plain)),
        MessageValue::Text(_) => None,
        MessageValue::Structured(message) => {
            if let Some(text) = message.text.as_deref().filter(|t| !t.is_empty()) {
                return Some((text.to_string(), TextType::Plain));
            }
            message
                .speech
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|speech| (speech.to_string(), TextType::Markup))
        }
    }
}

/// 按输出顺序惰性产出片段（同一条目内 message 先于 reprompt）
pub fn extract_segments<'a>(
    response: &'a CoreResponse,
    locale: &'a str,
) -> impl Iterator<Item = Segment> + 'a {
    response
        .output
        .iter()
        .enumerate()
        .flat_map(move |(entry_index, entry)| {
            OutputSlot::ALL.into_iter().filter_map(move |slot| {
                let (text, text_type) = resolve_text(entry.message_for(slot)?)?;
                Some(Segment {
                    entry_index,
                    slot,
                    text,
                    text_type,
                    locale: locale.to_string(),
                })
            })
        })
}
