//! 应用层错误定义

use thiserror::Error;

use crate::application::ports::{CacheError, TtsError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 配置错误（构建后端时发现，快速失败）
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }
}

impl From<CacheError> for ApplicationError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Configuration(msg) => Self::ConfigurationError(msg),
            other => Self::StorageError(other.to_string()),
        }
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::Configuration(msg) => Self::ConfigurationError(msg),
            other => Self::ExternalServiceError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_stay_configuration() {
        let err: ApplicationError = CacheError::Configuration("missing base_url".into()).into();
        assert!(matches!(err, ApplicationError::ConfigurationError(_)));

        let err: ApplicationError = TtsError::Configuration("missing voice_id".into()).into();
        assert!(matches!(err, ApplicationError::ConfigurationError(_)));
    }

    #[test]
    fn test_runtime_errors_are_mapped() {
        let err: ApplicationError = CacheError::IoError("disk".into()).into();
        assert!(matches!(err, ApplicationError::StorageError(_)));

        let err: ApplicationError = TtsError::Timeout.into();
        assert!(matches!(err, ApplicationError::ExternalServiceError(_)));
    }
}
