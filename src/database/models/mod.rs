pub mod company;
pub mod report;
pub mod report_type;
pub mod user;

pub use company::Company;
pub use report::{CompanySummary, PopulatedReport, Report, ReportTypeSummary, UserSummary};
pub use report_type::ReportType;
pub use user::{User, UserChanges};
