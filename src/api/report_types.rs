use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::validation::required;
use crate::database::models::ReportType;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ReportTypeRequest {
    #[validate(custom(function = "required"))]
    #[validate(length(max = 100))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportTypeResponse {
    pub id: String,
    pub name: String,
}

impl From<&ReportType> for ReportTypeResponse {
    fn from(report_type: &ReportType) -> Self {
        Self {
            id: report_type.id.to_hex(),
            name: report_type.name.clone(),
        }
    }
}

impl From<ReportType> for ReportTypeResponse {
    fn from(report_type: ReportType) -> Self {
        Self::from(&report_type)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTypeMessage {
    pub message: &'static str,
    pub report_type: ReportTypeResponse,
}
