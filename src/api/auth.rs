use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::validation::required;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(custom(function = "required"))]
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = "required"))]
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "required"))]
    pub token: String,
    #[validate(custom(function = "required"))]
    #[validate(length(min = 6))]
    pub new_password: String,
}
