use std::time::Duration;

use rideshare_service::config::{Config, ServiceConfig};
use rideshare_service::middleware::RateLimitConfig;
use serde::{Deserialize, Serialize};

/// Service name used in logs, health responses and metric prefixes
pub const SERVICE_NAME: &str = "api-gateway";

/// Port the gateway listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 8000;

/// Redis URL used by the `redis` rate limit backend without a `[redis]` section
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Full configuration for the gateway
pub type GatewayConfig = Config<GatewaySettings>;

/// Sections specific to the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default)]
    pub upstreams: UpstreamsConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisConfig>,
}

impl GatewaySettings {
    /// Redis URL for shared rate limit counters
    pub fn redis_url(&self) -> &str {
        self.redis
            .as_ref()
            .map(|r| r.url.as_str())
            .unwrap_or(DEFAULT_REDIS_URL)
    }
}

/// `[upstreams]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamsConfig {
    /// Base URL of the user service
    #[serde(default = "default_users_url")]
    pub users: String,

    /// Upstream request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            users: default_users_url(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl UpstreamsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[redis]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

fn default_users_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_upstream_timeout() -> u64 {
    30
}

/// Defaults applied before `config.toml` and the environment
pub fn defaults() -> GatewayConfig {
    Config::new(
        ServiceConfig::new(SERVICE_NAME, DEFAULT_PORT),
        GatewaySettings::default(),
    )
}
