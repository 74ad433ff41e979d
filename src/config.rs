//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_HOST` (optional): bind address, defaults to 0.0.0.0
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `DB_ACQUIRE_TIMEOUT_SECS` (optional): how long a request waits for a pooled connection, defaults to 5
/// - `DB_STATEMENT_TIMEOUT_MS` (optional): PostgreSQL `statement_timeout`, defaults to 10000
/// - `REQUEST_TIMEOUT_SECS` (optional): upper bound on one HTTP request, defaults to 10
/// - `CURRENCY_API_KEY` (optional): key for the exchange rate API; conversion is disabled without it
/// - `EXCHANGE_API_URL` (optional): conversion endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_host")]
    pub server_host: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default = "default_statement_timeout_ms")]
    pub db_statement_timeout_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub currency_api_key: Option<String>,

    #[serde(default = "default_exchange_api_url")]
    pub exchange_api_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_statement_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_exchange_api_url() -> String {
    "http://api.apilayer.com/exchangerates_data/convert".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// Address the HTTP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Currency API key, treating an empty value as unset.
    pub fn currency_api_key(&self) -> Option<&str> {
        self.currency_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}
