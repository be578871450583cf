//! Memory Layer - In-Memory Cache
//!
//! 进程内 TTS 缓存实现，适合测试和单实例部署

mod tts_cache;

pub use tts_cache::InMemoryTtsCache;
