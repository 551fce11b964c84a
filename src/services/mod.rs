//! Business rules over the stores: uniqueness pre-checks, input normalization and
//! the report read-back after every write.

pub mod auth_service;
pub mod company_service;
pub mod mailer;
pub mod report_service;
pub mod report_type_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use company_service::CompanyService;
pub use mailer::{Mailer, RelayMailer};
pub use report_service::ReportService;
pub use report_type_service::ReportTypeService;
pub use user_service::UserService;
