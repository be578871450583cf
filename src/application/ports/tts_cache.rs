//! TTS Cache Port - 合成音频缓存
//!
//! 以 (key, locale, format) 寻址的音频缓存抽象，具体实现见
//! infrastructure 层（文件存储 / Sled / 内存）。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::tts::AudioResult;

/// TTS Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid cache configuration: {0}")]
    Configuration(String),

    #[error("Invalid audio payload: {0}")]
    InvalidPayload(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// TTS Cache Port
///
/// 缓存只是优化手段：调用方必须把任何错误当作未命中 / 未写入处理。
/// 存储路径统一为 `{path}/{locale}/{key}.{extension}`。
#[async_trait]
pub trait TtsCachePort: Send + Sync {
    /// 查询缓存
    ///
    /// 未命中返回 `Ok(None)`。是否携带原始音频由实现的 `return_raw_audio` 配置决定。
    async fn get(
        &self,
        key: &str,
        locale: &str,
        output_format: &str,
    ) -> Result<Option<AudioResult>, CacheError>;

    /// 写入缓存
    ///
    /// `data` 不含原始音频时不做任何事。
    async fn store(&self, key: &str, locale: &str, data: &AudioResult) -> Result<(), CacheError>;

    /// 条目的公开访问地址（如果该后端对外暴露）
    fn public_url(&self, _key: &str, _locale: &str, _extension: Option<&str>) -> Option<String> {
        None
    }

    /// 后端类型标识（用于日志）
    fn backend_type(&self) -> &'static str;
}
