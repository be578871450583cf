//! Sled 嵌入式存储

mod tts_cache;

pub use tts_cache::{CacheStats, SledCacheConfig, SledTtsCache};
