use axum::extract::{Path, State};

use crate::api::report_types::{ReportTypeMessage, ReportTypeRequest, ReportTypeResponse};
use crate::api::ValidatedJson;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/reportTypes
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ReportTypeResponse>> {
    Ok(ApiResponse::success(state.report_types.list().await?))
}

/// POST /api/reportTypes
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ReportTypeRequest>,
) -> ApiResult<ReportTypeMessage> {
    let report_type = state.report_types.create(request).await?;
    Ok(ApiResponse::created(ReportTypeMessage {
        message: "Report type added successfully",
        report_type,
    }))
}

/// GET /api/reportTypes/:idOrName
pub async fn get(State(state): State<AppState>, Path(id_or_name): Path<String>) -> ApiResult<ReportTypeResponse> {
    Ok(ApiResponse::success(state.report_types.get(&id_or_name).await?))
}

/// PUT /api/reportTypes/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<ReportTypeRequest>,
) -> ApiResult<ReportTypeMessage> {
    let report_type = state.report_types.update(&id, request).await?;
    Ok(ApiResponse::success(ReportTypeMessage {
        message: "Report Type updated successfully",
        report_type,
    }))
}

/// DELETE /api/reportTypes/:id - 204 on success
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.report_types.delete(&id).await?;
    Ok(ApiResponse::no_content())
}
