//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::Duration;
use docvault_core::domain::SessionPolicy;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    /// Identity of the preconfigured analyzer the enrichment runs execute against.
    pub assistant_id: String,
    /// Fixed delay between run-status polls during enrichment.
    pub poll_interval_ms: u64,
    /// Ceiling on status polls per document before the run is abandoned.
    pub max_poll_attempts: u32,
    pub session_active_hours: i64,
    pub session_idle_days: i64,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Analysis Provider Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let assistant_id = std::env::var("ASSISTANT_ID")
            .map_err(|_| ConfigError::MissingVar("ASSISTANT_ID".to_string()))?;

        let poll_interval_ms = parse_var("POLL_INTERVAL_MS", 2000)?;
        let max_poll_attempts = parse_var("MAX_POLL_ATTEMPTS", 150)?;

        // --- Load Session and Upload Settings ---
        let session_active_hours = parse_var("SESSION_ACTIVE_HOURS", 24)?;
        let session_idle_days = parse_var("SESSION_IDLE_DAYS", 14)?;
        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            assistant_id,
            poll_interval_ms,
            max_poll_attempts,
            session_active_hours,
            session_idle_days,
            max_upload_bytes,
        })
    }

    /// The session expiry windows as a domain policy value.
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            active_period: Duration::hours(self.session_active_hours),
            idle_period: Duration::days(self.session_idle_days),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
