//! Router-level fixtures backed by the in-memory stores

pub mod memory;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bson::oid::ObjectId;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use crate::auth::{password, Role};
use crate::config::AppConfig;
use crate::database::models::{Company, ReportType, User};
use crate::error::ApiError;
use crate::routes;
use crate::services::Mailer;
use crate::state::AppState;

pub use memory::MemoryDb;

pub const TEST_PASSWORD: &str = "password123";

/// Records password-reset mail instead of sending it
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    /// `(recipient, new password)` pairs in send order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, _name: &str, new_password: &str) -> Result<(), ApiError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.to_string(), new_password.to_string()));
        }
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = "test-secret".to_string();
    config.api.enable_rate_limiting = false;
    config.api.enable_request_logging = false;
    config.server.public_base_url = Some("http://localhost:8787".to_string());
    config
}

pub struct TestContext {
    pub db: MemoryDb,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let db = MemoryDb::new();
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(config, db.stores(), mailer.clone());
        let router = routes::app(state.clone());
        Self {
            db,
            state,
            mailer,
            router,
        }
    }

    /// Stored user with `TEST_PASSWORD`
    pub fn seed_user(&self, name: &str, email: &str, role: Role) -> User {
        let hash = password::hash_password(TEST_PASSWORD).unwrap();
        let user = User::new(name.to_string(), email.to_string(), hash, role);
        self.db.lock().users.push(user.clone());
        user
    }

    /// Seeds a user of `role` and returns it with a valid token
    pub fn login_as(&self, role: Role) -> (User, String) {
        let email = format!("{}-{}@finsolvz.test", role.as_str().to_lowercase(), ObjectId::new().to_hex());
        let user = self.seed_user(role.as_str(), &email, role);
        let token = self.token_for(&user);
        (user, token)
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.jwt.issue(user.id, user.role).unwrap()
    }

    pub fn seed_company(&self, name: &str, members: &[ObjectId]) -> Company {
        let company = Company::new(name.to_string(), None, members.to_vec());
        self.db.lock().companies.push(company.clone());
        company
    }

    pub fn seed_report_type(&self, name: &str) -> ReportType {
        let report_type = ReportType::new(name.to_string());
        self.db.lock().report_types.push(report_type.clone());
        report_type
    }

    /// One request through the full middleware chain; the body comes back as JSON
    /// (`Value::Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
