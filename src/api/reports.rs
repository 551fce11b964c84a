use bson::Bson;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::api::validation::required;
use crate::auth::Role;
use crate::database::models::report::{optional_year, year_as_string};
use crate::database::models::{CompanySummary, PopulatedReport, ReportTypeSummary, UserSummary};
use crate::database::Page;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReportRequest {
    #[validate(custom(function = "required"))]
    #[validate(length(min = 1, max = 200))]
    pub report_name: String,
    #[validate(custom(function = "required"))]
    pub report_type: String,
    #[validate(custom(function = "required"))]
    #[serde(deserialize_with = "year_as_string")]
    pub year: String,
    #[validate(custom(function = "required"))]
    pub company: String,
    pub create_by: Option<String>,
    #[validate(length(max = 10))]
    pub currency: Option<String>,
    pub user_access: Option<Vec<String>>,
    pub report_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateReportRequest {
    #[validate(length(min = 1, max = 200))]
    pub report_name: Option<String>,
    pub report_type: Option<String>,
    #[serde(deserialize_with = "optional_year")]
    pub year: Option<String>,
    pub company: Option<String>,
    pub create_by: Option<String>,
    #[validate(length(max = 10))]
    pub currency: Option<String>,
    pub user_access: Option<Vec<String>>,
    pub report_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CompaniesRequest {
    pub company_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportTypeRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

impl From<ReportTypeSummary> for ReportTypeRef {
    fn from(summary: ReportTypeSummary) -> Self {
        Self {
            id: summary.id.to_hex(),
            name: summary.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompanySummary> for CompanyRef {
    fn from(summary: CompanySummary) -> Self {
        Self {
            id: summary.id.to_hex(),
            name: summary.name,
            profile_picture: summary.profile_picture,
            created_at: summary.created_at.to_chrono(),
            updated_at: summary.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserSummary> for UserRef {
    fn from(summary: UserSummary) -> Self {
        Self {
            id: summary.id.to_hex(),
            name: summary.name,
            email: summary.email,
            role: summary.role,
            created_at: summary.created_at.to_chrono(),
            updated_at: summary.updated_at.to_chrono(),
        }
    }
}

/// Populated report as sent to clients.
///
/// Missing references serialize as `null`; `userAccess` and `reportData` are always arrays
/// or values, never `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub report_name: String,
    pub report_type: Option<ReportTypeRef>,
    pub year: String,
    pub company: Option<CompanyRef>,
    pub currency: Option<String>,
    pub created_by: Option<UserRef>,
    pub user_access: Vec<UserRef>,
    pub report_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PopulatedReport> for ReportResponse {
    fn from(report: PopulatedReport) -> Self {
        Self {
            id: report.id.to_hex(),
            report_name: report.report_name,
            report_type: report.report_type.map(ReportTypeRef::from),
            year: report.year,
            company: report.company.map(CompanyRef::from),
            currency: report.currency,
            created_by: report.created_by.map(UserRef::from),
            user_access: report.user_access.into_iter().map(UserRef::from).collect(),
            report_data: report_data_json(report.report_data),
            created_at: report.created_at.to_chrono(),
            updated_at: report.updated_at.to_chrono(),
        }
    }
}

fn report_data_json(data: Bson) -> Value {
    match data {
        Bson::Null | Bson::Undefined => Value::Array(Vec::new()),
        other => other.into_relaxed_extjson(),
    }
}

/// `?page=&limit=`; values that do not parse fall back to the defaults
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: i64,
    pub skip: u64,
    pub total: u64,
}

impl PaginationQuery {
    /// `None` when neither parameter was given, meaning the caller wants the plain list
    pub fn page(&self) -> Option<Page> {
        if self.page.is_none() && self.limit.is_none() {
            return None;
        }
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        // Saturates so an absurd page number still yields a `$skip` Mongo accepts
        let skip = (page - 1).saturating_mul(limit as u64).min(i64::MAX as u64);
        Some(Page { skip, limit })
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedReports {
    pub data: Vec<ReportResponse>,
    pub pagination: Pagination,
}

/// GET /api/reports answers with either shape depending on the query
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReportListing {
    All(Vec<ReportResponse>),
    Paged(PaginatedReports),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
    use serde_json::json;

    fn populated(data: Bson) -> PopulatedReport {
        bson::from_document(doc! {
            "_id": ObjectId::new(),
            "reportName": "Q1",
            "year": "2024",
            "reportData": data,
            "createdAt": BsonDateTime::now(),
            "updatedAt": BsonDateTime::now(),
        })
        .unwrap()
    }

    #[test]
    fn missing_data_and_access_become_empty_arrays() {
        let json = serde_json::to_value(ReportResponse::from(populated(Bson::Null))).unwrap();
        assert_eq!(json["reportData"], json!([]));
        assert_eq!(json["userAccess"], json!([]));
        assert_eq!(json["company"], Value::Null);
        assert_eq!(json["reportType"], Value::Null);
        assert_eq!(json["createdBy"], Value::Null);
    }

    #[test]
    fn report_data_is_passed_through() {
        let data = bson::to_bson(&json!([{ "account": "Cash", "amount": 1200.5 }])).unwrap();
        let response = ReportResponse::from(populated(data));
        assert_eq!(response.report_data, json!([{ "account": "Cash", "amount": 1200.5 }]));
    }

    #[test]
    fn year_accepts_numbers() {
        let request: CreateReportRequest = serde_json::from_value(json!({
            "reportName": "Q1",
            "reportType": "x",
            "year": 2024,
            "company": "y",
        }))
        .unwrap();
        assert_eq!(request.year, "2024");

        let update: UpdateReportRequest = serde_json::from_value(json!({ "year": "2025" })).unwrap();
        assert_eq!(update.year.as_deref(), Some("2025"));
        let update: UpdateReportRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(update.year, None);
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(PaginationQuery::default().page(), None);

        let query = PaginationQuery {
            page: Some("3".into()),
            limit: None,
        };
        assert_eq!(query.page(), Some(Page { skip: 20, limit: 10 }));

        let query = PaginationQuery {
            page: Some("0".into()),
            limit: Some("500".into()),
        };
        assert_eq!(query.page(), Some(Page { skip: 0, limit: 100 }));

        let query = PaginationQuery {
            page: Some("abc".into()),
            limit: Some("-4".into()),
        };
        assert_eq!(query.page(), Some(Page { skip: 0, limit: 1 }));

        let query = PaginationQuery {
            page: Some(u64::MAX.to_string()),
            limit: Some("10".into()),
        };
        assert_eq!(
            query.page(),
            Some(Page {
                skip: i64::MAX as u64,
                limit: 10
            })
        );
    }
}
