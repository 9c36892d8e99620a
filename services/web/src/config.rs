//! services/web/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
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
    /// Origin of the REST backend, without the `/api` suffix.
    pub backend_url: String,
    pub log_level: Level,
    /// Pause applied after every successful backend response.
    pub response_delay: Duration,
    pub page_size: u32,
    pub request_timeout: Duration,
    /// How long a cached backend read is served before it is refetched.
    pub cache_ttl: Duration,
    /// Upper bound on cached reads, shared by every visitor.
    pub cache_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Backend ---
        let backend_url = std::env::var("BACKEND_URL")
            .map_err(|_| ConfigError::MissingVar("BACKEND_URL".to_string()))?;
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "BACKEND_URL".to_string(),
                format!("'{}' is not an http(s) URL", backend_url),
            ));
        }

        let response_delay = Duration::from_millis(parse_number("RESPONSE_DELAY_MS", 1000)?);
        let request_timeout = Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", 30)?);

        // --- Presentation ---
        let page_size = parse_number("PAGE_SIZE", 12)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        // --- Cache ---
        let cache_ttl = Duration::from_secs(parse_number("CACHE_TTL_SECS", 60)?);
        let cache_capacity = parse_number("CACHE_CAPACITY", 1024)?;
        if cache_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "CACHE_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            log_level,
            response_delay,
            page_size,
            request_timeout,
            cache_ttl,
            cache_capacity,
        })
    }

    /// Base URL every backend path is appended to.
    pub fn api_base(&self) -> String {
        format!("{}/api", self.backend_url)
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(var.to_string(), format!("'{}' is not a number", raw))
        }),
        Err(_) => Ok(default),
    }
}
