use bson::oid::ObjectId;
use std::sync::Arc;

use crate::api::report_types::{ReportTypeRequest, ReportTypeResponse};
use crate::api::validation::{looks_like_object_id, parse_id};
use crate::database::models::ReportType;
use crate::database::ReportTypeStore;
use crate::error::ApiError;

fn not_found() -> ApiError {
    ApiError::not_found("REPORT_TYPE_NOT_FOUND", "Report type not found")
}

fn invalid_name() -> ApiError {
    ApiError::bad_request("INVALID_REPORT_TYPE_NAME", "Report type name is invalid")
}

fn already_exists() -> ApiError {
    ApiError::conflict("REPORT_TYPE_ALREADY_EXISTS", "Report type name already exists")
}

fn parse_report_type_id(id: &str) -> Result<ObjectId, ApiError> {
    parse_id(id, "INVALID_REPORT_TYPE_ID", "Invalid report type ID format")
}

fn trimmed_name(request: &ReportTypeRequest) -> Result<String, ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(invalid_name());
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct ReportTypeService {
    report_types: Arc<dyn ReportTypeStore>,
}

impl ReportTypeService {
    pub fn new(report_types: Arc<dyn ReportTypeStore>) -> Self {
        Self { report_types }
    }

    pub async fn list(&self) -> Result<Vec<ReportTypeResponse>, ApiError> {
        let all = self.report_types.find_all().await?;
        Ok(all.into_iter().map(ReportTypeResponse::from).collect())
    }

    pub async fn create(&self, request: ReportTypeRequest) -> Result<ReportTypeResponse, ApiError> {
        let name = trimmed_name(&request)?;
        if self.report_types.find_by_name(&name).await?.is_some() {
            return Err(already_exists());
        }

        let report_type = ReportType::new(name);
        self.report_types.insert(&report_type).await?;
        tracing::info!(report_type_id = %report_type.id, name = %report_type.name, "report type created");
        Ok(ReportTypeResponse::from(report_type))
    }

    pub async fn get(&self, id_or_name: &str) -> Result<ReportTypeResponse, ApiError> {
        let report_type = if looks_like_object_id(id_or_name) {
            self.load(parse_report_type_id(id_or_name)?).await?
        } else {
            let name = id_or_name.trim();
            if name.is_empty() {
                return Err(invalid_name());
            }
            self.report_types.find_by_name(name).await?.ok_or_else(not_found)?
        };
        Ok(ReportTypeResponse::from(report_type))
    }

    pub async fn update(&self, id: &str, request: ReportTypeRequest) -> Result<ReportTypeResponse, ApiError> {
        let id = parse_report_type_id(id)?;
        let name = trimmed_name(&request)?;
        let mut report_type = self.load(id).await?;

        if name != report_type.name {
            if let Some(other) = self.report_types.find_by_name(&name).await? {
                if other.id != id {
                    return Err(already_exists());
                }
            }
        }
        report_type.name = name;

        if !self.report_types.update(&report_type).await? {
            return Err(not_found());
        }
        tracing::info!(report_type_id = %id, "report type updated");
        Ok(ReportTypeResponse::from(report_type))
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let id = parse_report_type_id(id)?;
        if !self.report_types.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!(report_type_id = %id, "report type deleted");
        Ok(())
    }

    async fn load(&self, id: ObjectId) -> Result<ReportType, ApiError> {
        self.report_types.find_by_id(id).await?.ok_or_else(not_found)
    }
}
