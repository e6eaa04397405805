//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `RIDESHARE_`, nested keys separated by `__`)
//! 2. Configuration file (default: `./config.toml`)
//! 3. Service defaults passed by the binary
//!
//! Each service extends the shared sections with its own settings through the
//! generic `custom` field, which is flattened into the top level of the file.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable prefix for every rideshare service
pub const ENV_PREFIX: &str = "RIDESHARE_";

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Log levels accepted by `service.log_level`
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
///
/// `T` holds the service-specific sections (for example `[users]` or
/// `[upstreams]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config<T> {
    /// Service configuration
    pub service: ServiceConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Service-specific configuration
    #[serde(flatten)]
    pub custom: T,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Create a service section with default log level, timeout and environment
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
            environment: default_environment(),
        }
    }

    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// CORS mode (permissive, restrictive)
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            cors_mode: default_cors_mode(),
        }
    }
}

impl MiddlewareConfig {
    /// Body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

impl<T> Config<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Build a configuration from a service section and its custom settings
    pub fn new(service: ServiceConfig, custom: T) -> Self {
        Self {
            service,
            middleware: MiddlewareConfig::default(),
            custom,
        }
    }

    /// Load configuration from `./config.toml` and the environment
    ///
    /// `defaults` supplies every value not set by a file or variable.
    pub fn load(defaults: Self) -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE, defaults)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>, defaults: Self) -> Result<Self> {
        let path = path.as_ref();

        let mut figment = Figment::new().merge(Serialized::defaults(defaults));

        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        } else {
            tracing::debug!("No configuration file at {}", path.display());
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment.extract().map_err(|e| Error::Config(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the shared sections
    pub fn validate(&self) -> Result<()> {
        if self.service.name.is_empty() {
            return Err(Error::Config(Box::new(figment::Error::from(
                "service.name cannot be empty".to_string(),
            ))));
        }

        if self.service.port == 0 {
            return Err(Error::Config(Box::new(figment::Error::from(
                "service.port must be greater than 0".to_string(),
            ))));
        }

        if !VALID_LOG_LEVELS.contains(&self.service.log_level.as_str()) {
            return Err(Error::Config(Box::new(figment::Error::from(format!(
                "service.log_level must be one of: {}",
                VALID_LOG_LEVELS.join(", ")
            )))));
        }

        Ok(())
    }
}
