pub mod auth;
pub mod limits;
pub mod logging;
pub mod rate_limit;
pub mod recovery;
pub mod response;

pub use auth::{authorize_middleware, jwt_auth_middleware, AuthUser};
pub use limits::{request_limits_middleware, RequestLimits};
pub use logging::{request_logging_middleware, RequestLogging};
pub use rate_limit::{rate_limit_middleware, FixedWindowLimiter};
pub use recovery::{expose_error_details, PanicResponder};
pub use response::{ApiResponse, ApiResult, Message};
