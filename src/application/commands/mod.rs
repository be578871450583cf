//! 应用层 - 命令（写操作）

mod tts_commands;

pub mod handlers;

pub use tts_commands::*;
