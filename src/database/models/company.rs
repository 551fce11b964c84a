use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Stored company document (`companies` collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub user: Vec<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Company {
    pub fn new(name: String, profile_picture: Option<String>, user: Vec<ObjectId>) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            name,
            profile_picture,
            user,
            created_at: now,
            updated_at: now,
        }
    }
}
