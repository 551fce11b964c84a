use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use bson::oid::ObjectId;

use crate::auth::{policy, Claims, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, injected by `jwt_auth_middleware` after token verification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: ObjectId,
    pub role: Role,
}

impl TryFrom<Claims> for AuthUser {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = ObjectId::parse_str(&claims.user_id)
            .map_err(|_| ApiError::unauthorized("JWT_INVALID", "Invalid or malformed token"))?;
        Ok(Self { id, role: claims.role })
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("USER_CONTEXT_MISSING", "Authentication required"))
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(request.headers())?;
    let claims = state.jwt.verify(token)?;

    let auth_user = AuthUser::try_from(claims)?;
    tracing::debug!(user_id = %auth_user.id, role = %auth_user.role, "authenticated request");
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Route guard: evaluates the policy table against the matched route template
pub async fn authorize_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());

    if let Some(minimum) = route
        .as_deref()
        .and_then(|route| policy::required_role(request.method(), route))
    {
        let user = request
            .extensions()
            .get::<AuthUser>()
            .ok_or_else(|| ApiError::unauthorized("USER_CONTEXT_MISSING", "Authentication required"))?;

        if !user.role.satisfies(minimum) {
            tracing::warn!(
                user_id = %user.id,
                role = %user.role,
                required = %minimum,
                route = route.as_deref().unwrap_or("-"),
                "access denied"
            );
            return Err(ApiError::forbidden());
        }
    }

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("MISSING_AUTH_HEADER", "Missing Authorization header"))?;

    let auth_str = auth_header.to_str().map_err(|_| {
        ApiError::unauthorized("INVALID_AUTH_FORMAT", "Invalid Authorization header format")
    })?;

    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::unauthorized(
            "INVALID_AUTH_FORMAT",
            "Authorization header must use Bearer token format",
        )
    })?;

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized("MISSING_TOKEN", "Token is missing"));
    }
    Ok(token)
}
