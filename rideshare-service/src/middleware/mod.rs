//! Middleware for rideshare services

pub mod metrics;
pub mod rate_limit;
pub mod request_tracking;

pub use metrics::{base_endpoint, metrics_handler, HttpMetrics};
pub use rate_limit::{
    MemoryRateLimitStore, RateLimitBackend, RateLimitConfig, RateLimitStore, RateLimiter,
    WindowCount,
};
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer, MakeUuidRequestId,
    REQUEST_ID_HEADER, SENSITIVE_HEADERS,
};

#[cfg(feature = "cache")]
pub use rate_limit::RedisRateLimitStore;
