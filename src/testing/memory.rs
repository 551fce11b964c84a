//! In-memory stores sharing one document set, so joins and unique keys behave like the database

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::database::models::{
    Company, CompanySummary, PopulatedReport, Report, ReportType, ReportTypeSummary, User, UserChanges, UserSummary,
};
use crate::database::{
    CompanyStore, HealthCheck, Page, ReportFilter, ReportStore, ReportTypeStore, Stores, UserStore,
};
use crate::error::ApiError;

#[derive(Debug, Default)]
pub struct Documents {
    pub users: Vec<User>,
    pub companies: Vec<Company>,
    pub report_types: Vec<ReportType>,
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDb {
    docs: Arc<Mutex<Documents>>,
    down: Arc<AtomicBool>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, Documents> {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the health check fail
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn stores(&self) -> Stores {
        Stores {
            users: Arc::new(self.clone()),
            companies: Arc::new(MemoryCompanies(self.clone())),
            report_types: Arc::new(MemoryReportTypes(self.clone())),
            reports: Arc::new(MemoryReports(self.clone())),
            health: Arc::new(self.clone()),
        }
    }
}

#[async_trait]
impl HealthCheck for MemoryDb {
    async fn ping(&self) -> Result<(), ApiError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ApiError::service_unavailable("Database unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn insert(&self, user: &User) -> Result<(), ApiError> {
        let mut docs = self.lock();
        if docs.users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::conflict("USER_ALREADY_EXISTS", "Email already registered"));
        }
        docs.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, ApiError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, ApiError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<User>, ApiError> {
        let mut users = self.lock().users.clone();
        users.reverse();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for user in &mut users {
            user.password.clear();
            user.reset_password_token = None;
        }
        Ok(users)
    }

    async fn find_by_reset_token(&self, token: &str, now: DateTime) -> Result<Option<User>, ApiError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| {
                u.reset_password_token.as_deref() == Some(token)
                    && u.reset_password_expires.is_some_and(|expires| expires > now)
            })
            .cloned())
    }

    async fn update_profile(&self, id: ObjectId, changes: &UserChanges) -> Result<bool, ApiError> {
        let mut docs = self.lock();
        if docs.users.iter().any(|u| u.id != id && u.email == changes.email) {
            return Err(ApiError::conflict(
                "EMAIL_ALREADY_EXISTS",
                "Email already used by another user",
            ));
        }
        let Some(user) = docs.users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        user.name = changes.name.clone();
        user.email = changes.email.clone();
        user.role = changes.role;
        user.company = changes.company.clone();
        user.updated_at = DateTime::now();
        Ok(true)
    }

    async fn set_password(&self, id: ObjectId, password_hash: &str) -> Result<bool, ApiError> {
        let mut docs = self.lock();
        let Some(user) = docs.users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        user.password = password_hash.to_string();
        user.reset_password_token = None;
        user.reset_password_expires = None;
        user.updated_at = DateTime::now();
        Ok(true)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
        let mut docs = self.lock();
        let before = docs.users.len();
        docs.users.retain(|u| u.id != id);
        Ok(docs.users.len() != before)
    }
}

pub struct MemoryCompanies(MemoryDb);

#[async_trait]
impl CompanyStore for MemoryCompanies {
    async fn insert(&self, company: &Company) -> Result<(), ApiError> {
        let mut docs = self.0.lock();
        if docs.companies.iter().any(|c| c.name == company.name) {
            return Err(ApiError::conflict("COMPANY_ALREADY_EXISTS", "Company name already exists"));
        }
        docs.companies.push(company.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Company>, ApiError> {
        Ok(self.0.lock().companies.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Company>, ApiError> {
        let docs = self.0.lock();
        let exact = docs.companies.iter().find(|c| c.name == name);
        let folded = || {
            let wanted = name.to_lowercase();
            docs.companies.iter().find(|c| c.name.to_lowercase() == wanted)
        };
        Ok(exact.or_else(folded).cloned())
    }

    async fn find_all(&self, limit: i64) -> Result<Vec<Company>, ApiError> {
        let mut companies = self.0.lock().companies.clone();
        companies.reverse();
        companies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        companies.truncate(limit.max(0) as usize);
        Ok(companies)
    }

    async fn find_by_user(&self, user_id: ObjectId) -> Result<Vec<Company>, ApiError> {
        let mut companies: Vec<Company> = self
            .0
            .lock()
            .companies
            .iter()
            .filter(|c| c.user.contains(&user_id))
            .cloned()
            .collect();
        companies.reverse();
        companies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(companies)
    }

    async fn update(&self, company: &Company) -> Result<bool, ApiError> {
        let mut docs = self.0.lock();
        if docs
            .companies
            .iter()
            .any(|c| c.id != company.id && c.name == company.name)
        {
            return Err(ApiError::conflict("COMPANY_ALREADY_EXISTS", "Company name already exists"));
        }
        let Some(stored) = docs.companies.iter_mut().find(|c| c.id == company.id) else {
            return Ok(false);
        };
        *stored = Company {
            updated_at: DateTime::now(),
            ..company.clone()
        };
        Ok(true)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
        let mut docs = self.0.lock();
        let before = docs.companies.len();
        docs.companies.retain(|c| c.id != id);
        Ok(docs.companies.len() != before)
    }
}

pub struct MemoryReportTypes(MemoryDb);

#[async_trait]
impl ReportTypeStore for MemoryReportTypes {
    async fn insert(&self, report_type: &ReportType) -> Result<(), ApiError> {
        let mut docs = self.0.lock();
        if docs.report_types.iter().any(|t| t.name == report_type.name) {
            return Err(ApiError::conflict(
                "REPORT_TYPE_ALREADY_EXISTS",
                "Report type name already exists",
            ));
        }
        docs.report_types.push(report_type.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<ReportType>, ApiError> {
        Ok(self.0.lock().report_types.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ReportType>, ApiError> {
        Ok(self.0.lock().report_types.iter().find(|t| t.name == name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<ReportType>, ApiError> {
        let mut all = self.0.lock().report_types.clone();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn update(&self, report_type: &ReportType) -> Result<bool, ApiError> {
        let mut docs = self.0.lock();
        if docs
            .report_types
            .iter()
            .any(|t| t.id != report_type.id && t.name == report_type.name)
        {
            return Err(ApiError::conflict(
                "REPORT_TYPE_ALREADY_EXISTS",
                "Report type name already exists",
            ));
        }
        let Some(stored) = docs.report_types.iter_mut().find(|t| t.id == report_type.id) else {
            return Ok(false);
        };
        stored.name = report_type.name.clone();
        Ok(true)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
        let mut docs = self.0.lock();
        let before = docs.report_types.len();
        docs.report_types.retain(|t| t.id != id);
        Ok(docs.report_types.len() != before)
    }
}

pub struct MemoryReports(MemoryDb);

fn matches(filter: &ReportFilter, report: &Report) -> bool {
    match filter {
        ReportFilter::All => true,
        ReportFilter::Id(id) => report.id == *id,
        ReportFilter::Name(name) => report.report_name == *name,
        ReportFilter::Company(id) => report.company == *id,
        ReportFilter::Companies(ids) => ids.contains(&report.company),
        ReportFilter::ReportType(id) => report.report_type == *id,
        ReportFilter::UserAccess(id) => report.user_access.contains(id),
        ReportFilter::CreatedBy(id) => report.created_by == *id,
    }
}

fn user_summary(user: &User) -> UserSummary {
    UserSummary {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

/// Same shape the aggregation produces: dangling references drop out
fn populate(docs: &Documents, report: &Report) -> PopulatedReport {
    PopulatedReport {
        id: report.id,
        report_name: report.report_name.clone(),
        report_type: docs
            .report_types
            .iter()
            .find(|t| t.id == report.report_type)
            .map(|t| ReportTypeSummary {
                id: t.id,
                name: t.name.clone(),
            }),
        year: report.year.clone(),
        company: docs
            .companies
            .iter()
            .find(|c| c.id == report.company)
            .map(|c| CompanySummary {
                id: c.id,
                name: c.name.clone(),
                profile_picture: c.profile_picture.clone(),
                created_at: c.created_at,
                updated_at: c.updated_at,
            }),
        currency: report.currency.clone(),
        created_by: docs
            .users
            .iter()
            .find(|u| u.id == report.created_by)
            .map(user_summary),
        user_access: docs
            .users
            .iter()
            .filter(|u| report.user_access.contains(&u.id))
            .map(user_summary)
            .collect(),
        report_data: report.report_data.clone(),
        created_at: report.created_at,
        updated_at: report.updated_at,
    }
}

#[async_trait]
impl ReportStore for MemoryReports {
    async fn insert(&self, report: &Report) -> Result<(), ApiError> {
        self.0.lock().reports.push(report.clone());
        Ok(())
    }

    async fn find_raw(&self, id: ObjectId) -> Result<Option<Report>, ApiError> {
        Ok(self.0.lock().reports.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, report: &Report) -> Result<bool, ApiError> {
        let mut docs = self.0.lock();
        let Some(stored) = docs.reports.iter_mut().find(|r| r.id == report.id) else {
            return Ok(false);
        };
        *stored = Report {
            created_at: stored.created_at,
            ..report.clone()
        };
        Ok(true)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ApiError> {
        let mut docs = self.0.lock();
        let before = docs.reports.len();
        docs.reports.retain(|r| r.id != id);
        Ok(docs.reports.len() != before)
    }

    async fn find_populated(
        &self,
        filter: &ReportFilter,
        page: Option<Page>,
    ) -> Result<Vec<PopulatedReport>, ApiError> {
        let docs = self.0.lock();
        let mut selected: Vec<&Report> = docs.reports.iter().filter(|r| matches(filter, r)).collect();

        if let Some(page) = page {
            selected.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            selected = selected
                .into_iter()
                .skip(page.skip as usize)
                .take(page.limit.max(0) as usize)
                .collect();
        }

        Ok(selected.into_iter().map(|r| populate(&docs, r)).collect())
    }

    async fn count(&self, filter: &ReportFilter) -> Result<u64, ApiError> {
        Ok(self
            .0
            .lock()
            .reports
            .iter()
            .filter(|r| matches(filter, r))
            .count() as u64)
    }
}
