//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::TtsReport;
use crate::domain::tts::CoreResponse;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// TTS DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProcessTtsRequest {
    /// 请求语言，缺省时使用配置的 fallback_locale
    #[serde(default)]
    pub locale: Option<String>,
    pub response: CoreResponse,
}

#[derive(Debug, Serialize)]
pub struct ProcessTtsResponse {
    pub response: CoreResponse,
    pub report: TtsReport,
}
