//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKETROW_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection
//!   string; required unless `MARKETROW_STORE=memory`
//!
//! ## Optional
//! - `MARKETROW_STORE` - Storage backend: `postgres` (default) or `memory`
//!   (volatile, for demos and local hacking)
//! - `MARKETROW_HOST` - Bind address (default: 127.0.0.1)
//! - `MARKETROW_PORT` - Listen port (default: 3000)
//! - `SMTP_HOST` - SMTP relay hostname; enables the order-confirmation
//!   email subscriber together with `SMTP_FROM`
//! - `SMTP_PORT` - SMTP relay port (default: 587)
//! - `SMTP_USERNAME` / `SMTP_PASSWORD` - SMTP credentials
//! - `SMTP_FROM` - From mailbox for outgoing mail (e.g., `shop@example.com`)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which storage backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Durable Postgres storage (production).
    #[default]
    Postgres,
    /// Volatile in-process storage (demos, tests).
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Storage backend selector.
    pub store_backend: StoreBackend,
    /// `PostgreSQL` connection URL (contains password); absent in memory mode.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// SMTP relay settings; `None` disables the email subscriber.
    pub smtp: Option<SmtpConfig>,
}

/// SMTP relay configuration for order-confirmation mail.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    /// Relay hostname.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Optional login username.
    pub username: Option<String>,
    /// Optional login password.
    pub password: Option<SecretString>,
    /// From mailbox for outgoing mail.
    pub from: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store_backend = get_env_or_default("MARKETROW_STORE", "postgres")
            .parse::<StoreBackend>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKETROW_STORE".to_string(), e))?;
        let database_url = match store_backend {
            StoreBackend::Postgres => Some(get_database_url("MARKETROW_DATABASE_URL")?),
            StoreBackend::Memory => None,
        };
        let host = get_env_or_default("MARKETROW_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKETROW_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MARKETROW_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MARKETROW_PORT".to_string(), e.to_string()))?;
        let smtp = SmtpConfig::from_env()?;

        Ok(Self {
            store_backend,
            database_url,
            host,
            port,
            smtp,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SmtpConfig {
    /// Loads the SMTP block; `None` when `SMTP_HOST` or `SMTP_FROM` is unset.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(host), Some(from)) = (get_optional_env("SMTP_HOST"), get_optional_env("SMTP_FROM"))
        else {
            return Ok(None);
        };

        let port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        Ok(Some(Self {
            host,
            port,
            username: get_optional_env("SMTP_USERNAME"),
            password: get_optional_env("SMTP_PASSWORD").map(SecretString::from),
            from,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    // Fallback to the generic name most Postgres tooling sets
    get_required_env("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
