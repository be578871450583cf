//! HTTP Middleware
//!
//! 按状态码记录异常响应及耗时

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// HTTP 状态码错误日志中间件
///
/// 业务错误（errno != 0）返回 200，在 `ApiError::into_response` 中记录；
/// 这里只处理真正的 4xx/5xx，例如 JSON 解析失败或静态文件不存在
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use tower::util::ServiceExt;

    async fn echo(Json(value): Json<serde_json::Value>) -> Json<serde_json::Value> {
        Json(value)
    }

    fn router() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .route("/fail", get(|| async { StatusCode::BAD_GATEWAY }))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(request: HttpRequest<Body>) -> StatusCode {
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_passes_through_success() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"output":[]}"#))
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_passes_through_malformed_json() {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        assert!(status_of(request).await.is_client_error());
    }

    #[tokio::test]
    async fn test_passes_through_server_error() {
        let request = HttpRequest::builder()
            .uri("/fail")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_GATEWAY);
    }
}
