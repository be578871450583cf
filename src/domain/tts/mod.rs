//! TTS Context - 语音合成上下文
//!
//! 职责:
//! - 宿主响应模型与音频槽位
//! - 可朗读片段提取
//! - 缓存 key 与存储路径

mod audio_result;
mod cache_key;
mod response;
mod segment;

pub use audio_result::{content_type_for_format, AudioResult, TextType};
pub use cache_key::{build_storage_path, derive_cache_key, is_valid_locale, join_url};
pub use response::{CoreResponse, MessageValue, OutputEntry, PlatformOutput, StructuredMessage};
pub use segment::{extract_segments, resolve_text, OutputSlot, Segment};
