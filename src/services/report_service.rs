use bson::{oid::ObjectId, Bson, DateTime};
use serde_json::Value;
use std::sync::Arc;

use crate::api::reports::{
    CompaniesRequest, CreateReportRequest, Pagination, PaginatedReports, PaginationQuery, ReportListing,
    ReportResponse, UpdateReportRequest,
};
use crate::api::validation::{parse_id, parse_ids};
use crate::database::models::Report;
use crate::database::{ReportFilter, ReportStore};
use crate::error::ApiError;

const MIN_COMPARED_COMPANIES: usize = 2;

fn not_found() -> ApiError {
    ApiError::not_found("REPORT_NOT_FOUND", "Report not found")
}

fn report_id(id: &str) -> Result<ObjectId, ApiError> {
    parse_id(id, "INVALID_REPORT_ID", "Invalid report ID format")
}

fn company_id(id: &str) -> Result<ObjectId, ApiError> {
    parse_id(id, "INVALID_COMPANY_ID", "Invalid company ID format")
}

fn report_type_id(id: &str) -> Result<ObjectId, ApiError> {
    parse_id(id, "INVALID_REPORT_TYPE_ID", "Invalid report type ID format")
}

fn user_id(id: &str) -> Result<ObjectId, ApiError> {
    parse_id(id, "INVALID_USER_ID", "Invalid user ID format")
}

fn user_access(ids: &[String]) -> Result<Vec<ObjectId>, ApiError> {
    parse_ids(ids, "INVALID_USER_ACCESS_ID", "Invalid user access ID format")
}

/// Payload to store; absent data is kept as an empty array
fn report_data(value: Option<Value>) -> Result<Bson, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(Bson::Array(Vec::new())),
        Some(value) => bson::to_bson(&value).map_err(ApiError::invalid_json),
    }
}

#[derive(Clone)]
pub struct ReportService {
    reports: Arc<dyn ReportStore>,
}

impl ReportService {
    pub fn new(reports: Arc<dyn ReportStore>) -> Self {
        Self { reports }
    }

    /// `created_by` is used when the body names no creator
    pub async fn create(&self, created_by: ObjectId, request: CreateReportRequest) -> Result<ReportResponse, ApiError> {
        let now = DateTime::now();
        let report = Report {
            id: ObjectId::new(),
            report_name: request.report_name.trim().to_string(),
            report_type: report_type_id(&request.report_type)?,
            year: request.year.trim().to_string(),
            company: company_id(&request.company)?,
            currency: request.currency,
            created_by: match request.create_by.as_deref() {
                Some(id) if !id.trim().is_empty() => user_id(id)?,
                _ => created_by,
            },
            user_access: user_access(request.user_access.as_deref().unwrap_or_default())?,
            report_data: report_data(request.report_data)?,
            created_at: now,
            updated_at: now,
        };

        self.reports.insert(&report).await?;
        tracing::info!(report_id = %report.id, company = %report.company, "report created");
        self.read_back(report.id).await
    }

    /// Merge the given fields onto the stored document
    pub async fn update(&self, id: &str, request: UpdateReportRequest) -> Result<ReportResponse, ApiError> {
        let id = report_id(id)?;
        let mut report = self.reports.find_raw(id).await?.ok_or_else(not_found)?;

        if let Some(name) = request.report_name {
            report.report_name = name.trim().to_string();
        }
        if let Some(value) = request.report_type.as_deref() {
            report.report_type = report_type_id(value)?;
        }
        if let Some(year) = request.year {
            report.year = year.trim().to_string();
        }
        if let Some(value) = request.company.as_deref() {
            report.company = company_id(value)?;
        }
        if let Some(value) = request.create_by.as_deref() {
            report.created_by = user_id(value)?;
        }
        if request.currency.is_some() {
            report.currency = request.currency;
        }
        if let Some(ids) = request.user_access.as_deref() {
            report.user_access = user_access(ids)?;
        }
        if request.report_data.is_some() {
            report.report_data = report_data(request.report_data)?;
        }
        report.updated_at = DateTime::now();

        if !self.reports.update(&report).await? {
            return Err(not_found());
        }
        tracing::info!(report_id = %id, "report updated");
        self.read_back(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let id = report_id(id)?;
        if !self.reports.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!(report_id = %id, "report deleted");
        Ok(())
    }

    /// Plain list, or one page plus totals when the query asks for paging
    pub async fn list(&self, query: &PaginationQuery) -> Result<ReportListing, ApiError> {
        let Some(page) = query.page() else {
            return Ok(ReportListing::All(self.find(ReportFilter::All).await?));
        };

        let total = self.reports.count(&ReportFilter::All).await?;
        let data = self
            .reports
            .find_populated(&ReportFilter::All, Some(page))
            .await?
            .into_iter()
            .map(ReportResponse::from)
            .collect();

        Ok(ReportListing::Paged(PaginatedReports {
            data,
            pagination: Pagination {
                page: page.skip / page.limit as u64 + 1,
                limit: page.limit,
                skip: page.skip,
                total,
            },
        }))
    }

    pub async fn get(&self, id: &str) -> Result<ReportResponse, ApiError> {
        self.read_back(report_id(id)?).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<ReportResponse, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("INVALID_REPORT_NAME", "Report name cannot be empty"));
        }
        self.first(ReportFilter::Name(name.to_string())).await
    }

    pub async fn by_company(&self, company: &str) -> Result<Vec<ReportResponse>, ApiError> {
        self.find(ReportFilter::Company(company_id(company)?)).await
    }

    /// Comparison across companies; fewer than two ids is a client error
    pub async fn by_companies(&self, request: CompaniesRequest) -> Result<Vec<ReportResponse>, ApiError> {
        if request.company_ids.len() < MIN_COMPARED_COMPANIES {
            return Err(ApiError::bad_request("INSUFFICIENT_COMPANIES", "Need 2 or more companies"));
        }
        let ids = request
            .company_ids
            .iter()
            .map(|id| company_id(id))
            .collect::<Result<Vec<_>, _>>()?;
        self.find(ReportFilter::Companies(ids)).await
    }

    pub async fn by_report_type(&self, report_type: &str) -> Result<Vec<ReportResponse>, ApiError> {
        self.find(ReportFilter::ReportType(report_type_id(report_type)?)).await
    }

    pub async fn by_user_access(&self, user: &str) -> Result<Vec<ReportResponse>, ApiError> {
        self.find(ReportFilter::UserAccess(user_id(user)?)).await
    }

    pub async fn by_created_by(&self, user: &str) -> Result<Vec<ReportResponse>, ApiError> {
        self.find(ReportFilter::CreatedBy(user_id(user)?)).await
    }

    async fn read_back(&self, id: ObjectId) -> Result<ReportResponse, ApiError> {
        self.first(ReportFilter::Id(id)).await
    }

    async fn first(&self, filter: ReportFilter) -> Result<ReportResponse, ApiError> {
        self.reports
            .find_populated(&filter, None)
            .await?
            .into_iter()
            .next()
            .map(ReportResponse::from)
            .ok_or_else(not_found)
    }

    async fn find(&self, filter: ReportFilter) -> Result<Vec<ReportResponse>, ApiError> {
        let reports = self.reports.find_populated(&filter, None).await?;
        Ok(reports.into_iter().map(ReportResponse::from).collect())
    }
}
