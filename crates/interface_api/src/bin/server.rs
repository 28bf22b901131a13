//! Weather Forecast Service - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! # In-memory store seeded with sample forecasts
//! cargo run --bin weather-forecast-api
//!
//! # PostgreSQL
//! APP__DATABASE__DB_TYPE=postgres APP__DATABASE__URL=postgres://... cargo run --bin weather-forecast-api
//! ```
//!
//! # Environment Variables
//!
//! * `APP__SERVER__HOST` / `APP__SERVER__PORT` - Listen address (default: 0.0.0.0:8080)
//! * `APP__SERVER__LOG_LEVEL` - Filter used when `RUST_LOG` is unset (default: info)
//! * `APP__SERVER__JSON_LOGS` - Emit JSON log lines
//! * `APP__DATABASE__DB_TYPE` - `postgres` or `in_memory` (default: in_memory)
//! * `APP__DATABASE__URL` - PostgreSQL connection string
//! * `APP__RATE_LIMIT__ENABLED`, `APP__RATE_LIMIT__PERMIT_LIMIT`, `APP__RATE_LIMIT__WINDOW_SECS`,
//!   `APP__RATE_LIMIT__QUEUE_LIMIT`
//! * `APP__APPLICATION__ACTIVITY_LOG_RETENTION` - Entries kept by the in-memory activity log

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, migrate, DatabaseHealth, PgActivityStore, PgForecastStore};
use interface_api::config::{ApiConfig, DbType, ServerConfig};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::load().context("failed to load configuration")?;
    init_tracing(&config.server);

    info!(
        name = %config.application.name,
        version = %config.application.version,
        db_type = ?config.database.db_type,
        "Starting weather forecast API server"
    );

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("invalid server address")?;
    let state = build_state(config).await?;
    let app = create_router(state);

    info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if server.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Opens the configured store; PostgreSQL is migrated and seeded first
async fn build_state(config: ApiConfig) -> anyhow::Result<AppState> {
    match config.database.db_type {
        DbType::Postgres => {
            info!("Connecting to database...");
            let pool = create_pool(config.database.pool_config())
                .await
                .context("failed to connect to database")?;
            migrate(&pool).await.context("failed to apply schema")?;
            info!("Database ready");

            Ok(AppState::new(
                Arc::new(PgForecastStore::new(pool.clone())),
                Arc::new(PgActivityStore::new(pool.clone())),
                DatabaseHealth::Postgres(pool),
                config,
            ))
        }
        DbType::InMemory => {
            info!("Using in-memory store with sample forecasts");
            Ok(AppState::in_memory(config))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
