//! Domain Layer - 领域层
//!
//! TTS Context: 响应模型、可朗读片段、缓存 key 与存储路径

pub mod tts;
