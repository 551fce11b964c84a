use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GREETING: &str = "✨ Finsolvz Backend API ✨";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub mail: MailConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub greeting: String,
    /// Base URL that relative company profile pictures are resolved against
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: Option<String>,
    pub name: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub max_idle_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub company_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("GREETING") {
            if !v.trim().is_empty() {
                self.server.greeting = v;
            }
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.server.public_base_url = non_empty(v);
        }

        // Database overrides
        if let Ok(v) = env::var("MONGO_URI") {
            self.database.uri = non_empty(v);
        }
        if let Ok(v) = env::var("MONGO_DB_NAME") {
            self.database.name = non_empty(v).unwrap_or(self.database.name);
        }
        if let Ok(v) = env::var("MONGO_MAX_POOL_SIZE") {
            self.database.max_pool_size = v.parse().unwrap_or(self.database.max_pool_size);
        }
        if let Ok(v) = env::var("MONGO_MIN_POOL_SIZE") {
            self.database.min_pool_size = v.parse().unwrap_or(self.database.min_pool_size);
        }
        if let Ok(v) = env::var("MONGO_MAX_IDLE_SECS") {
            self.database.max_idle_secs = v.parse().unwrap_or(self.database.max_idle_secs);
        }
        if let Ok(v) = env::var("MONGO_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Mail overrides
        if let Ok(v) = env::var("NODEMAILER_EMAIL") {
            self.mail.username = non_empty(v);
        }
        if let Ok(v) = env::var("NODEMAILER_PASS") {
            self.mail.password = non_empty(v);
        }
        if let Ok(v) = env::var("SMTP_HOST") {
            self.mail.smtp_host = non_empty(v).unwrap_or(self.mail.smtp_host);
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.mail.smtp_port = v.parse().unwrap_or(self.mail.smtp_port);
        }

        // Cache overrides
        if let Ok(v) = env::var("CACHE_COMPANY_TTL_SECS") {
            self.cache.company_ttl_secs = v.parse().unwrap_or(self.cache.company_ttl_secs);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8787,
                greeting: DEFAULT_GREETING.to_string(),
                public_base_url: None,
            },
            database: DatabaseConfig {
                uri: None,
                name: "Finsolvz".to_string(),
                max_pool_size: 10,
                min_pool_size: 1,
                max_idle_secs: 30,
                connect_timeout_secs: 10,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                request_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            mail: MailConfig {
                smtp_host: "smtp.gmail.com".to_string(),
                smtp_port: 587,
                username: None,
                password: None,
            },
            cache: CacheConfig {
                company_ttl_secs: 300,
                sweep_interval_secs: 60,
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.api.rate_limit_requests = 100;
        config.database.max_pool_size = 20;
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.api.rate_limit_requests = 100;
        config.database.max_pool_size = 50;
        config.database.min_pool_size = 5;
        config.database.connect_timeout_secs = 5;
        config
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Connection string, required at boot
    pub fn mongo_uri(&self) -> Result<&str, ConfigError> {
        self.database
            .uri
            .as_deref()
            .ok_or(ConfigError::Missing("MONGO_URI"))
    }

    pub fn public_base_url(&self) -> String {
        self.server
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.api.rate_limit_window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn company_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.company_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache.sweep_interval_secs)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
