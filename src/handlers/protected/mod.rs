// Every handler here runs after `jwt_auth_middleware` and `authorize_middleware`;
// role requirements live in the route policy table, not in the handlers.
pub mod companies;
pub mod report_types;
pub mod reports;
pub mod users;
