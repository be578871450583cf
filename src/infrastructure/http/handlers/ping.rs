//! Ping Handler
//!
//! 健康检查，同时报告合成服务和缓存后端状态

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub synthesizer: &'static str,
    pub cache: &'static str,
}

/// Ping endpoint - 健康检查
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    let synthesizer = if state.synthesizer.health_check().await {
        "ok"
    } else {
        tracing::warn!("TTS service health check failed");
        "unavailable"
    };

    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        synthesizer,
        cache: state
            .cache
            .as_ref()
            .map(|cache| cache.backend_type())
            .unwrap_or("none"),
    })
}
