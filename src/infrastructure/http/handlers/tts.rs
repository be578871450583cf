//! TTS Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::ProcessResponseCommand;
use crate::infrastructure::http::dto::{ApiResponse, ProcessTtsRequest, ProcessTtsResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 为宿主响应生成并挂载语音
///
/// 单个片段失败不会让请求失败，只会少一段音频
pub async fn process_tts(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessTtsRequest>,
) -> Result<Json<ApiResponse<ProcessTtsResponse>>, ApiError> {
    let cmd = ProcessResponseCommand {
        locale: req.locale,
        response: req.response,
    };

    let result = state.process_response_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(ProcessTtsResponse {
        response: result.response,
        report: result.report,
    })))
}
