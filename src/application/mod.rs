//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsCachePort、SpeechSynthesizerPort）
//! - orchestrator: 响应语音合成编排
//! - commands: 命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod orchestrator;
pub mod ports;

// Re-exports
pub use commands::{handlers::ProcessResponseHandler, ProcessResponseCommand, ProcessResponseResult};

pub use error::ApplicationError;

pub use orchestrator::{TtsOrchestrator, TtsReport, TtsSettings};

pub use ports::{CacheError, SpeechSynthesizerPort, TtsCachePort, TtsError};
