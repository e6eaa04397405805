//! API gateway
//!
//! Single entry point in front of the user service. Every request is counted
//! in Prometheus metrics; requests under `/api/users` are rate limited per
//! client and path, then forwarded to the upstream unchanged.

pub mod config;
pub mod proxy;

use std::sync::Arc;

use axum::middleware;
use prometheus::Registry;
use rideshare_service::prelude::*;

pub use config::{GatewayConfig, GatewaySettings, UpstreamsConfig};

/// Prefix of every gateway metric
pub const METRICS_PREFIX: &str = "gateway";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Pooled HTTP client shared by all proxied requests
    pub client: reqwest::Client,
    /// Base URL of the user service
    pub users_url: Arc<str>,
}

impl AppState {
    /// Build the upstream client from the `[upstreams]` section
    pub fn new(upstreams: &UpstreamsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(upstreams.timeout())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            users_url: Arc::from(upstreams.users.as_str()),
        })
    }
}

/// Build the rate limiter selected by `[rate_limit]`
///
/// Returns `None` when rate limiting is disabled. Rejections are counted in
/// `gateway_rate_limit_hits_total` on `registry`.
pub fn build_rate_limiter(
    settings: &GatewaySettings,
    registry: &Registry,
) -> Result<Option<RateLimiter>> {
    let config = &settings.rate_limit;
    if !config.enabled {
        info!("Rate limiting disabled");
        return Ok(None);
    }

    let store: Arc<dyn RateLimitStore> = match config.backend {
        RateLimitBackend::Memory => Arc::new(MemoryRateLimitStore::new()),
        RateLimitBackend::Redis => redis_store(settings.redis_url())?,
    };

    info!(
        backend = ?config.backend,
        max_requests = config.max_requests,
        window_secs = config.window_secs,
        "Rate limiting enabled"
    );

    let limiter = RateLimiter::new(store, config.max_requests, config.window())
        .with_hit_counter(METRICS_PREFIX, registry)?;
    Ok(Some(limiter))
}

#[cfg(feature = "cache")]
fn redis_store(url: &str) -> Result<Arc<dyn RateLimitStore>> {
    Ok(Arc::new(RedisRateLimitStore::from_url(url)?))
}

#[cfg(not(feature = "cache"))]
fn redis_store(_url: &str) -> Result<Arc<dyn RateLimitStore>> {
    Err(Error::Internal(
        "the redis rate limit backend requires the `cache` feature".to_string(),
    ))
}

/// Assemble the gateway router
///
/// The rate limiter wraps only the proxy routes. Metrics wrap everything,
/// including rejected requests.
pub fn router(state: AppState, metrics: HttpMetrics, limiter: Option<RateLimiter>) -> Router {
    let mut api = Router::new()
        .route("/api/users", any(proxy::proxy_users))
        .route("/api/users/{*path}", any(proxy::proxy_users))
        .with_state(state);

    if let Some(limiter) = limiter {
        api = api.route_layer(middleware::from_fn_with_state(
            limiter,
            RateLimiter::middleware,
        ));
    }

    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics.clone())
        .merge(health_routes(ServiceInfo::new(
            config::SERVICE_NAME,
            env!("CARGO_PKG_VERSION"),
        )))
        .merge(api)
        .layer(middleware::from_fn_with_state(
            metrics,
            HttpMetrics::middleware,
        ))
}

/// Build state, metrics and limiter from configuration and return the router
pub fn app(settings: &GatewaySettings) -> Result<Router> {
    let state = AppState::new(&settings.upstreams)?;
    let metrics = HttpMetrics::new(METRICS_PREFIX, Registry::new())?;
    let limiter = build_rate_limiter(settings, metrics.registry())?;

    Ok(router(state, metrics, limiter))
}
