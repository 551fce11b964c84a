use bson::{oid::ObjectId, Bson, DateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::Role;

/// Stored report document (`reports` collection). References only, never embedded objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub report_name: String,
    pub report_type: ObjectId,
    #[serde(default, deserialize_with = "year_as_string")]
    pub year: String,
    pub company: ObjectId,
    #[serde(default)]
    pub currency: Option<String>,
    pub created_by: ObjectId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_access: Vec<ObjectId>,
    #[serde(default)]
    pub report_data: Bson,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Report joined with the entities it references
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedReport {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub report_name: String,
    #[serde(default)]
    pub report_type: Option<ReportTypeSummary>,
    #[serde(default, deserialize_with = "year_as_string")]
    pub year: String,
    #[serde(default)]
    pub company: Option<CompanySummary>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserSummary>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_access: Vec<UserSummary>,
    #[serde(default)]
    pub report_data: Bson,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTypeSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Year {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<Year> for String {
    fn from(year: Year) -> Self {
        match year {
            Year::Text(s) => s.trim().to_string(),
            Year::Int(n) => n.to_string(),
            Year::Float(f) => (f.trunc() as i64).to_string(),
        }
    }
}

/// Older documents carry the year as an integer; both read back as a string.
pub(crate) fn year_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Year>::deserialize(deserializer)?
        .map(String::from)
        .unwrap_or_default())
}

pub(crate) fn optional_year<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Year>::deserialize(deserializer)?.map(String::from))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
