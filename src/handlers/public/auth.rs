use axum::extract::State;

use crate::api::auth::{ForgotPasswordRequest, LoginRequest, LoginResponse, ResetPasswordRequest};
use crate::api::ValidatedJson;
use crate::middleware::response::{ApiResponse, ApiResult, Message};
use crate::state::AppState;

/// POST /api/login - exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let token = state.auth.login(request).await?;
    Ok(ApiResponse::success(token))
}

/// POST /api/forgot-password - generate a new password and mail it
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<Message> {
    state.auth.forgot_password(request).await?;
    Ok(ApiResponse::success(Message::new("New password has been sent to your email")))
}

/// POST /api/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Message> {
    state.auth.reset_password(request).await?;
    Ok(ApiResponse::success(Message::new("Password successfully reset")))
}
