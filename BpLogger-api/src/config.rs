//! Application configuration, read once at startup

use std::env;

use thiserror::Error;
use tracing::info;

use bp_logger_domain::config::StoreConfig;

/// Port used when `PORT` is not set
pub const DEFAULT_PORT: u16 = 3000;

/// Environment reported when `APP_ENV` is not set
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),
}

/// Application configuration
#[derive(Debug)]
pub struct AppConfig {
    pub port: u16,
    /// Deployment environment reported by the health check
    pub environment: String,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Create the application configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create the application configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT").filter(|p| !p.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or(ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let environment = lookup("APP_ENV")
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        info!("Environment: {}", environment);

        Ok(Self {
            port,
            environment,
            store: StoreConfig::from_lookup(&lookup),
        })
    }
}
