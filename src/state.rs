use std::sync::Arc;

use crate::auth::JwtSigner;
use crate::cache::TtlCache;
use crate::config::AppConfig;
use crate::database::{HealthCheck, Stores};
use crate::middleware::rate_limit::FixedWindowLimiter;
use crate::services::{AuthService, CompanyService, Mailer, ReportService, ReportTypeService, UserService};

/// Everything the handlers share. Built once at boot, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtSigner,
    pub auth: AuthService,
    pub users: UserService,
    pub companies: CompanyService,
    pub report_types: ReportTypeService,
    pub reports: ReportService,
    pub rate_limiter: Arc<FixedWindowLimiter>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores, mailer: Arc<dyn Mailer>) -> Self {
        let jwt = JwtSigner::new(
            config.security.jwt_secret.clone(),
            config.security.jwt_expiry_hours,
        );
        let rate_limiter = Arc::new(FixedWindowLimiter::new(
            config.api.rate_limit_requests,
            config.rate_limit_window(),
        ));
        let companies = CompanyService::new(
            stores.companies.clone(),
            stores.users.clone(),
            Arc::new(TtlCache::new()),
            config.company_cache_ttl(),
            config.public_base_url(),
        );

        Self {
            jwt: jwt.clone(),
            auth: AuthService::new(stores.users.clone(), jwt, mailer),
            users: UserService::new(stores.users.clone()),
            companies,
            report_types: ReportTypeService::new(stores.report_types.clone()),
            reports: ReportService::new(stores.reports.clone()),
            rate_limiter,
            health: stores.health,
            config: Arc::new(config),
        }
    }
}
