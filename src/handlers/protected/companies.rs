use axum::extract::{Path, State};

use crate::api::companies::{CompanyMessage, CompanyResponse, CreateCompanyRequest, UpdateCompanyRequest};
use crate::api::ValidatedJson;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /api/company
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<CompanyResponse>> {
    Ok(ApiResponse::success(state.companies.list().await?))
}

/// POST /api/company
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCompanyRequest>,
) -> ApiResult<CompanyMessage> {
    let company = state.companies.create(request).await?;
    Ok(ApiResponse::created(CompanyMessage {
        message: "Company created successfully",
        company,
    }))
}

/// GET /api/company/:idOrName
pub async fn get(State(state): State<AppState>, Path(id_or_name): Path<String>) -> ApiResult<CompanyResponse> {
    Ok(ApiResponse::success(state.companies.get(&id_or_name).await?))
}

/// GET /api/user/companies - companies the caller belongs to
pub async fn for_current_user(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<CompanyResponse>> {
    Ok(ApiResponse::success(state.companies.for_user(user.id).await?))
}

/// PUT /api/company/:id (SUPER_ADMIN)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateCompanyRequest>,
) -> ApiResult<CompanyMessage> {
    let company = state.companies.update(&id, request).await?;
    Ok(ApiResponse::success(CompanyMessage {
        message: "Success",
        company,
    }))
}

/// DELETE /api/company/:id (SUPER_ADMIN)
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CompanyMessage> {
    let company = state.companies.delete(&id).await?;
    Ok(ApiResponse::success(CompanyMessage {
        message: "Company deleted successfully",
        company,
    }))
}
