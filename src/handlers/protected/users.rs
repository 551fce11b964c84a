use axum::extract::{Path, State};

use crate::api::users::{
    ChangePasswordRequest, RegisterRequest, RegisteredUser, UpdateRoleRequest, UpdateUserRequest, UpdatedUser,
    UserMessage, UserResponse,
};
use crate::api::ValidatedJson;
use crate::middleware::response::{ApiResponse, ApiResult, Message};
use crate::middleware::AuthUser;
use crate::state::AppState;

/// POST /api/register - create an account (SUPER_ADMIN)
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<RegisteredUser> {
    let new_user = state.users.register(request).await?;
    Ok(ApiResponse::created(RegisteredUser {
        message: "Success",
        new_user,
    }))
}

/// GET /api/users (ADMIN)
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<UserResponse>> {
    Ok(ApiResponse::success(state.users.list().await?))
}

/// GET /api/users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UserResponse> {
    Ok(ApiResponse::success(state.users.get(&id).await?))
}

/// GET /api/loginUser - the caller's own record
pub async fn current(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserResponse> {
    Ok(ApiResponse::success(state.users.current(user.id).await?))
}

/// PUT /api/users/:id (SUPER_ADMIN)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UpdatedUser> {
    let updated_user = state.users.update(&id, request).await?;
    Ok(ApiResponse::success(UpdatedUser {
        message: "User updated",
        updated_user,
    }))
}

/// DELETE /api/users/:id (SUPER_ADMIN)
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<UserMessage> {
    let user = state.users.delete(&id).await?;
    Ok(ApiResponse::success(UserMessage { message: "Success", user }))
}

/// PUT /api/updateRole (SUPER_ADMIN)
pub async fn update_role(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<UserMessage> {
    let user = state.users.update_role(request).await?;
    Ok(ApiResponse::success(UserMessage { message: "Success", user }))
}

/// PATCH /api/change-password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Message> {
    state.users.change_password(user.id, request).await?;
    Ok(ApiResponse::success(Message::new("Password successfully changed")))
}
