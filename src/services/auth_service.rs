use bson::DateTime;
use std::sync::Arc;

use crate::api::auth::{ForgotPasswordRequest, LoginRequest, LoginResponse, ResetPasswordRequest};
use crate::auth::password::{hash_password_blocking, random_hex, verify_password_blocking};
use crate::auth::JwtSigner;
use crate::database::UserStore;
use crate::error::ApiError;
use crate::services::mailer::Mailer;

const GENERATED_PASSWORD_LEN: usize = 12;

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("INVALID_CREDENTIALS", "Invalid email or password")
}

/// Login and password recovery
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtSigner,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtSigner, mailer: Arc<dyn Mailer>) -> Self {
        Self { users, jwt, mailer }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        let email = request.email.trim();
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password_blocking(request.password, user.password.clone()).await {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(invalid_credentials());
        }

        let access_token = self.jwt.issue(user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(LoginResponse { access_token })
    }

    /// Replace the password with a generated one and mail it to the account owner
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<(), ApiError> {
        let user = self
            .users
            .find_by_email(request.email.trim())
            .await?
            .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

        let new_password = random_hex(GENERATED_PASSWORD_LEN);
        let hash = hash_password_blocking(new_password.clone()).await?;
        if !self.users.set_password(user.id, &hash).await? {
            return Err(ApiError::not_found("USER_NOT_FOUND", "User not found"));
        }

        self.mailer
            .send_password_reset(&user.email, &user.name, &new_password)
            .await?;
        tracing::info!(user_id = %user.id, "password regenerated");
        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), ApiError> {
        let user = self
            .users
            .find_by_reset_token(request.token.trim(), DateTime::now())
            .await?
            .ok_or_else(|| ApiError::bad_request("INVALID_TOKEN", "Invalid or expired reset token"))?;

        let hash = hash_password_blocking(request.new_password).await?;
        self.users.set_password(user.id, &hash).await?;
        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }
}
