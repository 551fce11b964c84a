use axum::extract::{Path, Query, State};

use crate::api::reports::{
    CompaniesRequest, CreateReportRequest, PaginationQuery, ReportListing, ReportResponse, UpdateReportRequest,
};
use crate::api::ValidatedJson;
use crate::middleware::response::{ApiResponse, ApiResult, Message};
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /api/reports[?page=&limit=]
pub async fn list(State(state): State<AppState>, Query(query): Query<PaginationQuery>) -> ApiResult<ReportListing> {
    Ok(ApiResponse::success(state.reports.list(&query).await?))
}

/// POST /api/reports - the response is read back with its references populated
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateReportRequest>,
) -> ApiResult<ReportResponse> {
    Ok(ApiResponse::created(state.reports.create(user.id, request).await?))
}

/// GET /api/reports/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ReportResponse> {
    Ok(ApiResponse::success(state.reports.get(&id).await?))
}

/// PUT /api/reports/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateReportRequest>,
) -> ApiResult<ReportResponse> {
    Ok(ApiResponse::success(state.reports.update(&id, request).await?))
}

/// DELETE /api/reports/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Message> {
    state.reports.delete(&id).await?;
    Ok(ApiResponse::success(Message::new("Report deleted successfully")))
}

/// GET /api/reports/name/:name
pub async fn by_name(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<ReportResponse> {
    Ok(ApiResponse::success(state.reports.get_by_name(&name).await?))
}

/// GET /api/reports/company/:companyId
pub async fn by_company(State(state): State<AppState>, Path(company): Path<String>) -> ApiResult<Vec<ReportResponse>> {
    Ok(ApiResponse::success(state.reports.by_company(&company).await?))
}

/// POST /api/reports/companies - at least two company ids
pub async fn by_companies(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CompaniesRequest>,
) -> ApiResult<Vec<ReportResponse>> {
    Ok(ApiResponse::success(state.reports.by_companies(request).await?))
}

/// GET /api/reports/reportType/:reportType
pub async fn by_report_type(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
) -> ApiResult<Vec<ReportResponse>> {
    Ok(ApiResponse::success(state.reports.by_report_type(&report_type).await?))
}

/// GET /api/reports/userAccess/:id
pub async fn by_user_access(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<ReportResponse>> {
    Ok(ApiResponse::success(state.reports.by_user_access(&id).await?))
}

/// GET /api/reports/createdBy/:id
pub async fn by_created_by(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<ReportResponse>> {
    Ok(ApiResponse::success(state.reports.by_created_by(&id).await?))
}
