//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping          GET   健康检查
//! - /api/tts/process   POST  为宿主响应生成语音
//!
//! 文件缓存启用时，音频对象由 server 挂载为静态文件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/tts", tts_routes())
}

/// TTS 路由
fn tts_routes() -> Router<Arc<AppState>> {
    Router::new().route("/process", post(handlers::process_tts))
}
