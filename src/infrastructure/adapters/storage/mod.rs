//! Storage Adapter - 文件系统音频缓存

mod file_tts_cache;

pub use file_tts_cache::{FileTtsCache, FileTtsCacheConfig};
