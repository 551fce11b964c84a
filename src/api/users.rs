use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::validation::{known_role, required};
use crate::auth::Role;
use crate::database::models::User;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(custom(function = "required"))]
    #[validate(length(min = 2, max = 50))]
    pub name: String,
    #[validate(custom(function = "required"))]
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "required"))]
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(custom(function = "required"))]
    #[validate(custom(function = "known_role"))]
    pub role: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[validate(custom(function = "known_role"))]
    pub role: Option<String>,
    pub company: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateRoleRequest {
    #[validate(custom(function = "required"))]
    pub user_id: String,
    #[validate(custom(function = "required"))]
    #[validate(custom(function = "known_role"))]
    pub new_role: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordRequest {
    #[validate(custom(function = "required"))]
    #[validate(length(min = 6))]
    pub new_password: String,
    #[validate(custom(function = "required"))]
    pub confirm_password: String,
}

/// Public user shape; never carries the password hash or reset token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            company: user.company.iter().map(|id| id.to_hex()).collect(),
            created_at: user.created_at.to_chrono(),
            updated_at: user.updated_at.to_chrono(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub message: &'static str,
    pub new_user: UserResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedUser {
    pub message: &'static str,
    pub updated_user: UserResponse,
}

/// `{"message": ..., "user": ...}`
#[derive(Debug, Serialize)]
pub struct UserMessage {
    pub message: &'static str,
    pub user: UserResponse,
}
