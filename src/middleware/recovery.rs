use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use std::any::Any;

use crate::error::{ApiError, ErrorCause};

/// Builds the response for a panicked handler. Plugged into `CatchPanicLayer::custom`.
#[derive(Debug, Clone, Copy)]
pub struct PanicResponder {
    pub expose_details: bool,
}

impl tower_http::catch_panic::ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn Any + Send + 'static>,
    ) -> axum::http::Response<Self::ResponseBody> {
        let detail = panic_message(err.as_ref());
        // the panic hook already logged the backtrace at the panic site
        tracing::error!(panic = %detail, "handler panicked");

        let mut body = ApiError::internal_server_error().to_json();
        if self.expose_details {
            body["cause"] = serde_json::Value::String(detail);
        }
        (axum::http::StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Development mode only: copies the internal cause of an error response into its body
pub async fn expose_error_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(ErrorCause(cause)) = response.extensions().get::<ErrorCause>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to buffer error body");
            return ApiError::internal_server_error().into_response();
        }
    };

    let mut json: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    json["cause"] = serde_json::Value::String(cause);

    let encoded = serde_json::to_vec(&json).unwrap_or_else(|_| bytes.to_vec());
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(encoded))
}
