//! Request and response bodies for the HTTP surface

pub mod auth;
pub mod companies;
pub mod report_types;
pub mod reports;
pub mod users;
pub mod validation;

pub use validation::ValidatedJson;
