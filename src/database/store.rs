use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use std::sync::Arc;

use crate::database::models::{Company, PopulatedReport, Report, ReportType, User, UserChanges};
use crate::database::population::ReportFilter;
use crate::error::ApiError;

/// Skip/limit window over a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: i64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user; a unique-email rejection maps to `USER_ALREADY_EXISTS`
    async fn insert(&self, user: &User) -> Result<(), ApiError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, ApiError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, ApiError>;
    async fn find_all(&self) -> Result<Vec<User>, ApiError>;
    /// User holding `token` whose expiry is still after `now`
    async fn find_by_reset_token(&self, token: &str, now: DateTime) -> Result<Option<User>, ApiError>;
    /// Returns false when no user has `id`; a unique-email rejection maps to `EMAIL_ALREADY_EXISTS`
    async fn update_profile(&self, id: ObjectId, changes: &UserChanges) -> Result<bool, ApiError>;
    /// Replace the password hash and clear any pending reset token
    async fn set_password(&self, id: ObjectId, password_hash: &str) -> Result<bool, ApiError>;
    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn insert(&self, company: &Company) -> Result<(), ApiError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Company>, ApiError>;
    /// Exact match first, then a case-insensitive whole-name match
    async fn find_by_name(&self, name: &str) -> Result<Option<Company>, ApiError>;
    /// Newest first
    async fn find_all(&self, limit: i64) -> Result<Vec<Company>, ApiError>;
    async fn find_by_user(&self, user_id: ObjectId) -> Result<Vec<Company>, ApiError>;
    async fn update(&self, company: &Company) -> Result<bool, ApiError>;
    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait ReportTypeStore: Send + Sync {
    async fn insert(&self, report_type: &ReportType) -> Result<(), ApiError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<ReportType>, ApiError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<ReportType>, ApiError>;
    async fn find_all(&self) -> Result<Vec<ReportType>, ApiError>;
    async fn update(&self, report_type: &ReportType) -> Result<bool, ApiError>;
    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError>;
}

/// Report persistence. Writes take the raw document; reads go through the assembler.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert(&self, report: &Report) -> Result<(), ApiError>;
    async fn find_raw(&self, id: ObjectId) -> Result<Option<Report>, ApiError>;
    async fn update(&self, report: &Report) -> Result<bool, ApiError>;
    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError>;
    async fn find_populated(
        &self,
        filter: &ReportFilter,
        page: Option<Page>,
    ) -> Result<Vec<PopulatedReport>, ApiError>;
    async fn count(&self, filter: &ReportFilter) -> Result<u64, ApiError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), ApiError>;
}

/// The persistence adapters handed to the services
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub companies: Arc<dyn CompanyStore>,
    pub report_types: Arc<dyn ReportTypeStore>,
    pub reports: Arc<dyn ReportStore>,
    pub health: Arc<dyn HealthCheck>,
}
