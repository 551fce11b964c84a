use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

use finsolvz_api::config::AppConfig;
use finsolvz_api::database::DatabaseManager;
use finsolvz_api::routes;
use finsolvz_api::services::RelayMailer;
use finsolvz_api::state::AppState;
use finsolvz_api::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up MONGO_URI, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();
    telemetry::init(&config);
    telemetry::install_panic_hook();
    tracing::info!(environment = ?config.environment, "Starting Finsolvz API");

    config.mongo_uri().context("cannot start without a database")?;
    if config.security.jwt_secret.is_empty() {
        tracing::warn!("JWT_SECRET is not set; token operations will fail");
    }

    let database = DatabaseManager::connect(&config)
        .await
        .context("failed to create database client")?;
    // The driver reconnects lazily, so an unreachable server at boot is not fatal
    if let Err(e) = database.health_check().await {
        tracing::warn!(error = %e, "database ping failed at startup");
    }
    if let Err(e) = database.ensure_indexes().await {
        tracing::warn!(error = %e, "failed to ensure database indexes");
    }

    let mailer = Arc::new(RelayMailer::new(config.mail.clone()));
    let state = AppState::new(config, database.stores(), mailer);

    let sweep_interval = state.config.sweep_interval();
    let sweepers = [
        state.companies.cache().spawn_sweeper(sweep_interval),
        state.rate_limiter.spawn_sweeper(state.config.rate_limit_window()),
    ];

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "Finsolvz API listening");

    let app = routes::app(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    for sweeper in sweepers {
        sweeper.abort();
    }
    database.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
