//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

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
    /// When absent the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Base URL of the web client, used for links in notifications.
    pub app_base_url: String,
    pub cors_origin: String,
    pub notify_webhook_url: Option<String>,
    pub session_ttl_days: i64,
    /// Reject appointments whose participants are not connected to the creator.
    pub require_connected_participants: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_url: None,
            log_level: Level::INFO,
            app_base_url: "http://localhost:3000".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            notify_webhook_url: None,
            session_ttl_days: 7,
            require_connected_participants: false,
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

fn parse_ttl_days(value: &str) -> Result<i64, ConfigError> {
    match value.trim().parse::<i64>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(ConfigError::InvalidValue(
            "SESSION_TTL_DAYS".to_string(),
            format!("'{}' is not a positive number of days", value),
        )),
    }
}

/// Reads an optional variable, treating an empty value as unset.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
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
        let defaults = Self::default();

        // --- Load Server and Database Settings ---
        let bind_address = match optional_var("BIND_ADDRESS") {
            Some(addr) => addr.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let database_url = optional_var("DATABASE_URL");

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Web and Notification Settings ---
        let app_base_url = optional_var("APP_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.app_base_url);
        let cors_origin = optional_var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);
        let notify_webhook_url = optional_var("NOTIFY_WEBHOOK_URL");

        // --- Load Policy Settings ---
        let session_ttl_days = match optional_var("SESSION_TTL_DAYS") {
            Some(days) => parse_ttl_days(&days)?,
            None => defaults.session_ttl_days,
        };
        let require_connected_participants = match optional_var("REQUIRE_CONNECTED_PARTICIPANTS")
        {
            Some(flag) => parse_bool("REQUIRE_CONNECTED_PARTICIPANTS", &flag)?,
            None => defaults.require_connected_participants,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            app_base_url,
            cors_origin,
            notify_webhook_url,
            session_ttl_days,
            require_connected_participants,
        })
    }

    /// The database URL, for commands that cannot run without one.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))
    }
}
