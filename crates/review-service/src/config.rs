//! Review Service configuration.
//!
//! Configuration is loaded from environment variables. The database URL is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default maximum number of pooled database connections.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Default minimum number of pooled database connections.
pub const DEFAULT_DB_MIN_CONNECTIONS: u32 = 1;

/// Default Postgres `statement_timeout` in seconds.
pub const DEFAULT_DB_QUERY_TIMEOUT_SECONDS: u32 = 5;

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Review Service configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    pub db_max_connections: u32,

    pub db_min_connections: u32,

    /// Applied as Postgres `statement_timeout` on every connection.
    pub db_query_timeout_seconds: u32,

    /// Requests running longer than this get 408.
    pub request_timeout_seconds: u64,

    /// Wait after a shutdown signal before closing (default: 0).
    pub drain_seconds: u64,

    pub log_format: LogFormat,

    /// Apply embedded migrations at startup (default: true).
    pub run_migrations: bool,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_query_timeout_seconds", &self.db_query_timeout_seconds)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("drain_seconds", &self.drain_seconds)
            .field("log_format", &self.log_format)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid database pool configuration: {0}")]
    InvalidPoolSize(String),

    #[error("Invalid timeout configuration: {0}")]
    InvalidTimeout(String),

    #[error("Invalid log format: {0}")]
    InvalidLogFormat(String),

    #[error("Invalid boolean flag: {0}")]
    InvalidFlag(String),
}

/// Parse an optional integer variable, falling back to `default`.
fn parse_number<T>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
    err: fn(String) -> ConfigError,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match vars.get(name) {
        Some(value_str) => value_str.parse().map_err(|e| {
            err(format!(
                "{} must be a valid non-negative integer, got '{}': {}",
                name, value_str, e
            ))
        }),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let db_max_connections = parse_number(
            vars,
            "DB_MAX_CONNECTIONS",
            DEFAULT_DB_MAX_CONNECTIONS,
            ConfigError::InvalidPoolSize,
        )?;
        if db_max_connections == 0 {
            return Err(ConfigError::InvalidPoolSize(
                "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }

        let db_min_connections = parse_number(
            vars,
            "DB_MIN_CONNECTIONS",
            DEFAULT_DB_MIN_CONNECTIONS.min(db_max_connections),
            ConfigError::InvalidPoolSize,
        )?;
        if db_min_connections > db_max_connections {
            return Err(ConfigError::InvalidPoolSize(format!(
                "DB_MIN_CONNECTIONS ({}) must not exceed DB_MAX_CONNECTIONS ({})",
                db_min_connections, db_max_connections
            )));
        }

        let db_query_timeout_seconds = parse_number(
            vars,
            "DB_QUERY_TIMEOUT_SECONDS",
            DEFAULT_DB_QUERY_TIMEOUT_SECONDS,
            ConfigError::InvalidTimeout,
        )?;
        if db_query_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout(
                "DB_QUERY_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        let request_timeout_seconds = parse_number(
            vars,
            "REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
            ConfigError::InvalidTimeout,
        )?;
        if request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout(
                "REQUEST_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }

        let drain_seconds = parse_number(vars, "DRAIN_SECONDS", 0, ConfigError::InvalidTimeout)?;

        let log_format = match vars.get("LOG_FORMAT").map(|s| s.to_ascii_lowercase()) {
            None => LogFormat::default(),
            Some(value) if value == "text" => LogFormat::Text,
            Some(value) if value == "json" => LogFormat::Json,
            Some(value) => {
                return Err(ConfigError::InvalidLogFormat(format!(
                    "LOG_FORMAT must be 'text' or 'json', got '{}'",
                    value
                )))
            }
        };

        let run_migrations = match vars.get("RUN_MIGRATIONS").map(|s| s.to_ascii_lowercase()) {
            None => true,
            Some(value) if value == "true" || value == "1" => true,
            Some(value) if value == "false" || value == "0" => false,
            Some(value) => {
                return Err(ConfigError::InvalidFlag(format!(
                    "RUN_MIGRATIONS must be 'true' or 'false', got '{}'",
                    value
                )))
            }
        };

        Ok(Config {
            database_url,
            bind_address,
            db_max_connections,
            db_min_connections,
            db_query_timeout_seconds,
            request_timeout_seconds,
            drain_seconds,
            log_format,
            run_migrations,
        })
    }
}
