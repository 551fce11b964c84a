pub mod auth;
pub mod health;

pub use auth::{forgot_password, login, reset_password};
pub use health::{health, root};
