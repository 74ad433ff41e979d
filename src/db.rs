//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Running database migrations automatically

use std::str::FromStr;

use sqlx::{
    Pool, Postgres,
    postgres::{PgConnectOptions, PgPoolOptions},
};

use crate::config::Config;

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// The pool is the only admission control in front of the ledger: when every
/// connection is busy a request waits up to `DB_ACQUIRE_TIMEOUT_SECS` and then
/// fails with a store error.
///
/// Every connection is opened with `statement_timeout` set, so a statement that
/// runs too long is cancelled by the server and the surrounding transaction is
/// rolled back by the ledger engine.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(config: &Config) -> Result<DbPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.database_url)?.options([(
        "statement_timeout",
        config.db_statement_timeout_ms.to_string(),
    )]);

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each migration runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}
