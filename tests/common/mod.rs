use anyhow::{Context, Result};
use bson::oid::ObjectId;

use finsolvz_api::config::AppConfig;
use finsolvz_api::database::{DatabaseManager, Stores};

/// A throwaway database on the server named by `TEST_MONGO_URI`.
///
/// Tests return early when the variable is unset so the suite still runs without a server.
pub struct TestDb {
    pub config: AppConfig,
    pub manager: DatabaseManager,
}

impl TestDb {
    pub async fn connect() -> Result<Option<Self>> {
        let Ok(uri) = std::env::var("TEST_MONGO_URI") else {
            eprintln!("TEST_MONGO_URI not set; skipping");
            return Ok(None);
        };

        let mut config = AppConfig::development();
        config.database.uri = Some(uri);
        config.database.name = format!("finsolvz_test_{}", ObjectId::new().to_hex());
        config.database.connect_timeout_secs = 5;
        config.security.jwt_secret = "integration-secret".to_string();
        config.api.enable_rate_limiting = false;

        let manager = DatabaseManager::connect(&config)
            .await
            .context("failed to create test client")?;
        manager.health_check().await.context("test database did not answer ping")?;
        manager.ensure_indexes().await.context("failed to create indexes")?;

        Ok(Some(Self { config, manager }))
    }

    pub fn stores(&self) -> Stores {
        self.manager.stores()
    }

    pub async fn drop(self) -> Result<()> {
        self.manager.database().drop(None).await?;
        self.manager.shutdown().await;
        Ok(())
    }
}
