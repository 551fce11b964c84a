pub mod companies;
pub mod manager;
pub mod models;
pub mod population;
pub mod report_types;
pub mod reports;
pub mod repository;
pub mod store;
pub mod users;

pub use manager::{DatabaseError, DatabaseManager};
pub use population::ReportFilter;
pub use store::{CompanyStore, HealthCheck, Page, ReportStore, ReportTypeStore, Stores, UserStore};
