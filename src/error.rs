// HTTP API Error Types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Field name -> human readable problem, keyed by wire (camelCase) names
pub type FieldErrors = BTreeMap<String, String>;

/// Structured application error.
///
/// Every failure that reaches the HTTP layer is expressed as one of these: a status,
/// a stable machine `code`, a client-safe `message`, optional per-field details and an
/// optional internal cause that is only logged (or surfaced in development mode).
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<FieldErrors>,
    cause: Option<anyhow::Error>,
}

/// Internal cause attached to error responses so the development-mode layer can expose it.
#[derive(Debug, Clone)]
pub struct ErrorCause(pub String);

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    pub fn with_details(mut self, details: FieldErrors) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&FieldErrors> {
        self.details.as_ref()
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "code": self.code,
            "message": self.message,
        });
        if let Some(details) = &self.details {
            body["details"] = json!(details);
        }
        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn validation(details: FieldErrors) -> Self {
        Self::bad_request("VALIDATION_ERROR", "Invalid input data").with_details(details)
    }

    pub fn invalid_json(cause: impl Into<anyhow::Error>) -> Self {
        Self::bad_request("INVALID_JSON", "Invalid JSON format").with_cause(cause)
    }

    pub fn invalid_id(code: &'static str, message: impl Into<String>) -> Self {
        Self::bad_request(code, message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "Access denied")
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMIT_EXCEEDED",
            "Too many requests, please try again later",
        )
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn internal_server_error() -> Self {
        Self::internal(
            "INTERNAL_SERVER_ERROR",
            "An unexpected internal server error occurred",
        )
    }

    pub fn database(cause: impl Into<anyhow::Error>) -> Self {
        Self::internal("DATABASE_ERROR", "A database error occurred").with_cause(cause)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status.as_u16(), self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {:#}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.cause {
                Some(cause) => tracing::error!(code = self.code, error = %format!("{:#}", cause), "{}", self.message),
                None => tracing::error!(code = self.code, "{}", self.message),
            }
        } else {
            tracing::debug!(code = self.code, status = self.status.as_u16(), "{}", self.message);
        }

        let mut response = (self.status, Json(self.to_json())).into_response();
        if let Some(cause) = self.cause {
            response
                .extensions_mut()
                .insert(ErrorCause(format!("{:#}", cause)));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_code_and_message() {
        let err = ApiError::conflict("COMPANY_ALREADY_EXISTS", "Company name already exists");
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(
            err.to_json(),
            json!({"code": "COMPANY_ALREADY_EXISTS", "message": "Company name already exists"})
        );
    }

    #[test]
    fn validation_error_lists_fields() {
        let mut details = FieldErrors::new();
        details.insert("email".into(), "Please provide a valid email address".into());
        let body = ApiError::validation(details).to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["email"], "Please provide a valid email address");
    }

    #[test]
    fn cause_is_kept_out_of_the_body() {
        let err = ApiError::database(anyhow::anyhow!("connection reset by peer"));
        let body = err.to_json();
        assert!(body.get("details").is_none());
        assert!(!body.to_string().contains("connection reset"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn response_stashes_cause_for_debug_layer() {
        let response = ApiError::database(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let cause = response.extensions().get::<ErrorCause>().cloned();
        assert_eq!(cause.map(|c| c.0), Some("boom".to_string()));
    }
}
