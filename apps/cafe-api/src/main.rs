//! # Kube Café API
//!
//! REST server for the café storefront and back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Café API Server                                  │
//! │                                                                         │
//! │  Browser ───► HTTP (5000) ───► axum routes ───► SQLite (cafe-db)       │
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                               UPLOAD_DIR                                │
//! │                            (menu images)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use cafe_api::{build_router, ApiConfig, AppState};
use cafe_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,cafe_api=debug,cafe_db=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Kube Café API server...");

    // Load configuration
    let config = ApiConfig::load().context("Invalid configuration")?;
    info!(
        port = config.port,
        database = %config.database_url,
        env = ?config.app_env,
        "Configuration loaded"
    );
    if config.uses_dev_secrets() {
        warn!("JWT_SECRET or JWT_ADMIN_SECRET not set, using built-in development secrets");
    }

    // Connect to database (runs migrations)
    let db = Database::new(DbConfig::from_url(&config.database_url))
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Create shared state
    let state = Arc::new(AppState::new(db.clone(), config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
