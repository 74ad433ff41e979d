//! Ledger Service - Main Application Entry Point
//!
//! A REST API server that keeps account balances and an immutable history of
//! every balance change. It supports crediting and debiting single accounts
//! (opening an account on its first credit), atomic transfers between two
//! accounts, history listing, and converting a balance into another currency.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build the ledger service and HTTP router
//! 5. Serve until Ctrl-C / SIGTERM, then close the pool

mod app;
mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod models;
mod services;
mod store;

use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::services::exchange_service::ExchangeClient;
use crate::services::ledger_service::LedgerService;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let exchange = match config.currency_api_key() {
        Some(key) => Some(ExchangeClient::new(&config.exchange_api_url, key)?),
        None => {
            tracing::warn!("CURRENCY_API_KEY not set, currency conversion disabled");
            None
        }
    };

    let ledger = LedgerService::new(PgStore::new(pool.clone()));
    let app = app::router(
        AppState::new(ledger, exchange).with_request_timeout(config.request_timeout()),
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Shut down");

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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
