use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Stored user document (`users` collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub company: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_expires: Option<DateTime>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            name,
            email,
            password: password_hash,
            role,
            company: Vec::new(),
            created_at: now,
            updated_at: now,
            reset_password_token: None,
            reset_password_expires: None,
        }
    }
}

/// Profile fields written by a user update. The password hash has its own path.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company: Vec<ObjectId>,
}

impl From<&User> for UserChanges {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            company: user.company.clone(),
        }
    }
}
