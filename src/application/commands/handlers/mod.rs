//! Command Handlers 实现

mod tts_handlers;

pub use tts_handlers::*;
