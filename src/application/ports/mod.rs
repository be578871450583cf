//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod speech_synthesizer;
mod tts_cache;

pub use speech_synthesizer::{SpeechSynthesizerPort, TtsError};
pub use tts_cache::{CacheError, TtsCachePort};
