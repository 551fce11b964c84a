use bson::oid::ObjectId;
use std::sync::Arc;

use crate::api::users::{ChangePasswordRequest, RegisterRequest, UpdateRoleRequest, UpdateUserRequest, UserResponse};
use crate::api::validation::{parse_id, parse_ids};
use crate::auth::password::hash_password_blocking;
use crate::auth::Role;
use crate::database::models::{User, UserChanges};
use crate::database::UserStore;
use crate::error::ApiError;

const INVALID_USER_ID: &str = "INVALID_USER_ID";
const INVALID_USER_ID_MESSAGE: &str = "Invalid user ID format";

pub(crate) fn user_not_found() -> ApiError {
    ApiError::not_found("USER_NOT_FOUND", "User not found")
}

fn role(value: &str) -> Result<Role, ApiError> {
    Role::parse(value).ok_or_else(|| ApiError::bad_request("INVALID_ROLE", "Invalid role"))
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, ApiError> {
        let email = request.email.trim().to_string();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::conflict("USER_ALREADY_EXISTS", "Email already registered"));
        }

        let role = role(&request.role)?;
        let hash = hash_password_blocking(request.password).await?;
        let user = User::new(request.name.trim().to_string(), email, hash, role);
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(UserResponse::from(user))
    }

    pub async fn list(&self) -> Result<Vec<UserResponse>, ApiError> {
        let users = self.users.find_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<UserResponse, ApiError> {
        let id = parse_id(id, INVALID_USER_ID, INVALID_USER_ID_MESSAGE)?;
        Ok(UserResponse::from(self.load(id).await?))
    }

    /// The authenticated caller's own record
    pub async fn current(&self, caller: ObjectId) -> Result<UserResponse, ApiError> {
        Ok(UserResponse::from(self.load(caller).await?))
    }

    pub async fn update(&self, id: &str, request: UpdateUserRequest) -> Result<UserResponse, ApiError> {
        let id = parse_id(id, INVALID_USER_ID, INVALID_USER_ID_MESSAGE)?;
        let mut user = self.load(id).await?;

        if let Some(email) = request.email.as_deref().map(str::trim) {
            if email != user.email {
                if let Some(other) = self.users.find_by_email(email).await? {
                    if other.id != user.id {
                        return Err(ApiError::conflict(
                            "EMAIL_ALREADY_EXISTS",
                            "Email already used by another user",
                        ));
                    }
                }
            }
            user.email = email.to_string();
        }
        if let Some(name) = request.name {
            user.name = name.trim().to_string();
        }
        if let Some(value) = request.role.as_deref() {
            user.role = role(value)?;
        }
        if let Some(company) = request.company.as_deref() {
            user.company = parse_ids(company, "INVALID_COMPANY_ID", "Invalid company ID format")?;
        }

        if !self.users.update_profile(id, &UserChanges::from(&user)).await? {
            return Err(user_not_found());
        }
        if let Some(password) = request.password {
            let hash = hash_password_blocking(password).await?;
            self.users.set_password(id, &hash).await?;
        }

        tracing::info!(user_id = %id, "user updated");
        Ok(UserResponse::from(self.load(id).await?))
    }

    /// Returns the record as it was before deletion
    pub async fn delete(&self, id: &str) -> Result<UserResponse, ApiError> {
        let id = parse_id(id, INVALID_USER_ID, INVALID_USER_ID_MESSAGE)?;
        let user = self.load(id).await?;
        if !self.users.delete(id).await? {
            return Err(user_not_found());
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(UserResponse::from(user))
    }

    pub async fn update_role(&self, request: UpdateRoleRequest) -> Result<UserResponse, ApiError> {
        let id = parse_id(&request.user_id, INVALID_USER_ID, INVALID_USER_ID_MESSAGE)?;
        let new_role = role(&request.new_role)?;

        let mut user = self.load(id).await?;
        let previous = user.role;
        user.role = new_role;
        if !self.users.update_profile(id, &UserChanges::from(&user)).await? {
            return Err(user_not_found());
        }

        tracing::info!(user_id = %id, from = %previous, to = %new_role, "role changed");
        Ok(UserResponse::from(self.load(id).await?))
    }

    pub async fn change_password(&self, caller: ObjectId, request: ChangePasswordRequest) -> Result<(), ApiError> {
        if request.new_password != request.confirm_password {
            return Err(ApiError::bad_request("PASSWORD_MISMATCH", "Passwords do not match"));
        }
        self.load(caller).await?;

        let hash = hash_password_blocking(request.new_password).await?;
        if !self.users.set_password(caller, &hash).await? {
            return Err(user_not_found());
        }
        tracing::info!(user_id = %caller, "password changed");
        Ok(())
    }

    async fn load(&self, id: ObjectId) -> Result<User, ApiError> {
        self.users.find_by_id(id).await?.ok_or_else(user_not_found)
    }
}
