use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Stored report type (`reporttypes` collection)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportType {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

impl ReportType {
    pub fn new(name: String) -> Self {
        Self {
            id: ObjectId::new(),
            name,
        }
    }
}
