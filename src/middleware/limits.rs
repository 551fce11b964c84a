use axum::{
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;

use crate::error::ApiError;

/// Per-request caps applied before any handler runs
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub max_body_bytes: usize,
    pub timeout: Duration,
}

fn payload_too_large() -> ApiError {
    ApiError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        "PAYLOAD_TOO_LARGE",
        "Request body is too large",
    )
}

/// Rejects declared oversize bodies up front and bounds the handler's run time.
///
/// Bodies without a length are capped while streaming by the body limit layer.
pub async fn request_limits_middleware(
    State(limits): State<RequestLimits>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limits.max_body_bytes) {
        tracing::debug!(declared = ?declared, max = limits.max_body_bytes, "request body over limit");
        return payload_too_large().into_response();
    }

    let method = request.method().clone();
    let uri = request.uri().clone();
    match tokio::time::timeout(limits.timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(method = %method, uri = %uri, timeout_secs = limits.timeout.as_secs(), "request timed out");
            ApiError::new(StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT", "Request timeout").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::post, Router};
    use tower::ServiceExt;

    fn app(limits: RequestLimits) -> Router {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_millis(200)).await;
            "done"
        }
        async fn echo(body: String) -> String {
            body
        }

        Router::new()
            .route("/slow", post(slow))
            .route("/echo", post(echo))
            .layer(middleware::from_fn_with_state(limits, request_limits_middleware))
    }

    fn post_req(uri: &str, body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn declared_oversize_body_is_rejected() {
        let limits = RequestLimits {
            max_body_bytes: 4,
            timeout: Duration::from_secs(5),
        };
        let response = app(limits).oneshot(post_req("/echo", "too long")).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = app(limits).oneshot(post_req("/echo", "ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn slow_handler_times_out() {
        let limits = RequestLimits {
            max_body_bytes: 1024,
            timeout: Duration::from_millis(20),
        };
        let response = app(limits).oneshot(post_req("/slow", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
