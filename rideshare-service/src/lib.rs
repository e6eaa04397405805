//! # rideshare-service
//!
//! Shared plumbing for the rideshare HTTP services: layered configuration,
//! a single error type with a JSON `{"message": ...}` envelope, JSON tracing,
//! an axum server with a standard middleware stack and graceful shutdown,
//! health probes, Prometheus HTTP metrics and a fixed-window rate limiter.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rideshare_service::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Custom {}
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load(Config::new(ServiceConfig::new("my-service", 3000), Custom::default()))?;
//!     init_tracing(&config.service)?;
//!
//!     let app: Router = Router::new()
//!         .merge(health_routes(ServiceInfo::new(&config.service.name, env!("CARGO_PKG_VERSION"))));
//!
//!     Server::new(config.service, config.middleware).serve(app).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod observability;
pub mod server;

pub use error::{Error, MessageResponse, Result};

/// Common imports for service crates
pub mod prelude {
    pub use crate::config::{Config, MiddlewareConfig, ServiceConfig};
    pub use crate::error::{Error, MessageResponse, Result};
    pub use crate::health::{health, health_routes, readiness, ServiceInfo};
    pub use crate::middleware::{
        base_endpoint, metrics_handler, HttpMetrics, MemoryRateLimitStore, RateLimitBackend,
        RateLimitConfig, RateLimitStore, RateLimiter,
    };
    pub use crate::observability::init_tracing;
    pub use crate::server::Server;

    #[cfg(feature = "cache")]
    pub use crate::middleware::RedisRateLimitStore;

    pub use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        routing::{any, delete, get, post, put},
        Json, Router,
    };
    pub use tracing::{debug, error, info, warn};
}
