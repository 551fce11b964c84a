use async_trait::async_trait;
use bson::doc;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions},
    Client, Database, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::database::companies::MongoCompanyStore;
use crate::database::report_types::MongoReportTypeStore;
use crate::database::reports::MongoReportStore;
use crate::database::store::{HealthCheck, Stores};
use crate::database::users::MongoUserStore;
use crate::error::ApiError;

pub const USERS: &str = "users";
pub const COMPANIES: &str = "companies";
pub const REPORT_TYPES: &str = "reporttypes";
pub const REPORTS: &str = "reports";

const DUPLICATE_KEY: i32 = 11000;

/// Errors from DatabaseManager and the repositories
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Duplicate key: {0}")]
    DuplicateKey(mongodb::error::Error),

    #[error(transparent)]
    Mongo(mongodb::error::Error),

    #[error("Failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),
}

impl From<mongodb::error::Error> for DatabaseError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            DatabaseError::DuplicateKey(err)
        } else {
            DatabaseError::Mongo(err)
        }
    }
}

impl DatabaseError {
    /// Map to an API error, turning a unique-index rejection into the given conflict
    pub fn or_conflict(self, code: &'static str, message: &'static str) -> ApiError {
        match self {
            DatabaseError::DuplicateKey(e) => ApiError::conflict(code, message).with_cause(e),
            other => other.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(name) => {
                ApiError::internal("CONFIG_MISSING", format!("{} is not configured", name))
            }
            other => ApiError::database(other),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Owns the driver client; the driver manages the connection pool itself
#[derive(Clone, Debug)]
pub struct DatabaseManager {
    client: Client,
    db: Database,
}

impl DatabaseManager {
    pub async fn connect(config: &AppConfig) -> Result<Self, DatabaseError> {
        let uri = config
            .database
            .uri
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("MONGO_URI"))?;

        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("finsolvz-api".to_string());
        options.max_pool_size = Some(config.database.max_pool_size);
        options.min_pool_size = Some(config.database.min_pool_size);
        options.max_idle_time = Some(Duration::from_secs(config.database.max_idle_secs));
        options.connect_timeout = Some(Duration::from_secs(config.database.connect_timeout_secs));
        options.server_selection_timeout =
            Some(Duration::from_secs(config.database.connect_timeout_secs));

        let client = Client::with_options(options)?;
        let db = client.database(&config.database.name);

        info!(database = %config.database.name, "Created database client");
        Ok(Self { client, db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Pings the server to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    /// Create every index the adapters rely on. Idempotent.
    pub async fn ensure_indexes(&self) -> Result<(), DatabaseError> {
        let unique = || IndexOptions::builder().unique(true).build();
        let sparse = IndexOptions::builder().sparse(true).build();

        self.db
            .collection::<bson::Document>(USERS)
            .create_indexes(
                vec![
                    IndexModel::builder().keys(doc! { "email": 1 }).options(unique()).build(),
                    IndexModel::builder()
                        .keys(doc! { "resetPasswordToken": 1 })
                        .options(sparse)
                        .build(),
                    IndexModel::builder().keys(doc! { "company": 1 }).build(),
                ],
                None,
            )
            .await?;

        self.db
            .collection::<bson::Document>(COMPANIES)
            .create_indexes(
                vec![
                    IndexModel::builder().keys(doc! { "name": 1 }).options(unique()).build(),
                    IndexModel::builder().keys(doc! { "createdAt": 1 }).build(),
                ],
                None,
            )
            .await?;

        self.db
            .collection::<bson::Document>(REPORT_TYPES)
            .create_indexes(
                vec![IndexModel::builder().keys(doc! { "name": 1 }).options(unique()).build()],
                None,
            )
            .await?;

        let report_keys = [
            doc! { "company": 1 },
            doc! { "reportType": 1 },
            doc! { "createdBy": 1 },
            doc! { "userAccess": 1 },
            doc! { "reportName": 1 },
            doc! { "year": 1 },
            doc! { "createdAt": -1 },
            doc! { "company": 1, "reportType": 1 },
            doc! { "company": 1, "year": 1 },
        ];
        self.db
            .collection::<bson::Document>(REPORTS)
            .create_indexes(
                report_keys
                    .into_iter()
                    .map(|keys| IndexModel::builder().keys(keys).build()),
                None,
            )
            .await?;

        info!("Database indexes ensured");
        Ok(())
    }

    /// Adapters over this database
    pub fn stores(&self) -> Stores {
        Stores {
            users: Arc::new(MongoUserStore::new(&self.db)),
            companies: Arc::new(MongoCompanyStore::new(&self.db)),
            report_types: Arc::new(MongoReportTypeStore::new(&self.db)),
            reports: Arc::new(MongoReportStore::new(&self.db)),
            health: Arc::new(self.clone()),
        }
    }

    /// Close the client (e.g., on shutdown)
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("Closed database client");
    }
}

#[async_trait]
impl HealthCheck for DatabaseManager {
    async fn ping(&self) -> Result<(), ApiError> {
        self.health_check()
            .await
            .map_err(|e| ApiError::service_unavailable("Database unavailable").with_cause(e))
    }
}
