//! Fixed-window rate limiting middleware
//!
//! Requests are counted under `ratelimit:{client_ip}:{path}`. The first hit
//! opens a window; once the count inside the window exceeds the limit the
//! request is rejected with 429 and never reaches the inner service.
//!
//! Counters live either in process memory or, with the `cache` feature, in
//! Redis so several gateway instances share one budget.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::HeaderValue, HeaderName},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use prometheus::{IntCounterVec, Opts, Registry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "cache")]
use deadpool_redis::Pool as RedisPool;
#[cfg(feature = "cache")]
use std::ops::DerefMut;

use crate::error::{Error, Result};

/// Entries kept in the memory store before expired windows are swept
const PURGE_THRESHOLD: usize = 10_000;

/// Client key used when the peer address is unknown
const UNKNOWN_CLIENT: &str = "unknown";

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests allowed per client and path in one window
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Counter backend (memory, redis)
    #[serde(default)]
    pub backend: RateLimitBackend,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            backend: RateLimitBackend::default(),
        }
    }
}

impl RateLimitConfig {
    /// Window length as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Where rate limit counters are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Process-local counters
    #[default]
    Memory,
    /// Shared counters in Redis (requires the `cache` feature)
    Redis,
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> u64 {
    100
}

fn default_window_secs() -> u64 {
    60
}

/// Counter state after recording one hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Hits in the current window, including this one
    pub count: u64,
    /// Time until the window closes
    pub resets_in: Duration,
}

/// Storage for fixed-window counters
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record one hit for `key` and return the updated window count
    ///
    /// A key without an open window starts a new one lasting `window`.
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowCount>;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    expires_at: Instant,
}

/// In-memory counter store
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: DashMap<String, Window>,
}

impl MemoryRateLimitStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every window that has already closed
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.windows.retain(|_, window| window.expires_at > now);
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no keys are tracked
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowCount> {
        if self.windows.len() > PURGE_THRESHOLD {
            self.purge_expired();
        }

        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            expires_at: now + window,
        });

        if entry.expires_at <= now {
            *entry = Window {
                count: 0,
                expires_at: now + window,
            };
        }
        entry.count += 1;

        Ok(WindowCount {
            count: entry.count,
            resets_in: entry.expires_at.saturating_duration_since(now),
        })
    }
}

/// Redis-backed counter store using `INCR` and `EXPIRE`
#[cfg(feature = "cache")]
#[derive(Clone)]
pub struct RedisRateLimitStore {
    pool: RedisPool,
}

#[cfg(feature = "cache")]
impl RedisRateLimitStore {
    /// Create a store on top of a Redis pool
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Build a pool from a `redis://` URL
    pub fn from_url(url: &str) -> Result<Self> {
        let pool = deadpool_redis::Config::from_url(url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| Error::Internal(format!("Failed to create Redis pool: {}", e)))?;
        Ok(Self::new(pool))
    }
}

#[cfg(feature = "cache")]
#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowCount> {
        let mut conn = self.pool.get().await.map_err(|e| {
            Error::from(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Failed to get Redis connection",
                e.to_string(),
            )))
        })?;

        let window_secs = window.as_secs().max(1);

        let count: u64 = redis::cmd("INCR")
            .arg(key)
            .query_async(conn.deref_mut())
            .await?;

        if count == 1 {
            let _: () = redis::cmd("EXPIRE")
                .arg(key)
                .arg(window_secs)
                .query_async(conn.deref_mut())
                .await?;
        }

        let ttl: i64 = redis::cmd("TTL")
            .arg(key)
            .query_async(conn.deref_mut())
            .await
            .unwrap_or(window_secs as i64);

        let resets_in = if ttl > 0 {
            Duration::from_secs(ttl as u64)
        } else {
            window
        };

        Ok(WindowCount { count, resets_in })
    }
}

/// Rate limiting middleware state
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_requests: u64,
    window: Duration,
    hits: Option<IntCounterVec>,
}

impl RateLimiter {
    /// Create a limiter over any counter store
    pub fn new(store: Arc<dyn RateLimitStore>, max_requests: u64, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
            hits: None,
        }
    }

    /// Create a limiter from configuration with in-memory counters
    pub fn in_memory(config: &RateLimitConfig) -> Self {
        Self::new(
            Arc::new(MemoryRateLimitStore::new()),
            config.max_requests,
            config.window(),
        )
    }

    /// Count rejected requests in `{prefix}_rate_limit_hits_total{client_ip}`
    pub fn with_hit_counter(mut self, prefix: &str, registry: &Registry) -> Result<Self> {
        let hits = IntCounterVec::new(
            Opts::new(format!("{}_rate_limit_hits_total", prefix), "Rate limit hits"),
            &["client_ip"],
        )
        .map_err(|e| Error::Internal(format!("metrics: {}", e)))?;
        registry
            .register(Box::new(hits.clone()))
            .map_err(|e| Error::Internal(format!("metrics: {}", e)))?;
        self.hits = Some(hits);
        Ok(self)
    }

    /// Counter key for a client and request path
    pub fn key(client_ip: &str, path: &str) -> String {
        format!("ratelimit:{}:{}", client_ip, path)
    }

    /// Record a request and decide whether it may proceed
    pub async fn check(&self, client_ip: &str, path: &str) -> Result<WindowCount> {
        let key = Self::key(client_ip, path);
        let result = self.store.hit(&key, self.window).await?;

        debug!(
            rate_limit.key = %key,
            rate_limit.count = result.count,
            "Rate limit check"
        );

        if result.count > self.max_requests {
            warn!(
                "Rate limit exceeded for {}: {} requests (limit: {})",
                key, result.count, self.max_requests
            );
            if let Some(hits) = &self.hits {
                hits.with_label_values(&[client_ip]).inc();
            }
            return Err(Error::RateLimitExceeded);
        }

        Ok(result)
    }

    /// Middleware function to enforce the limit
    pub async fn middleware(
        State(limiter): State<Self>,
        request: Request,
        next: Next,
    ) -> std::result::Result<Response, Error> {
        let client_ip = client_ip(&request);
        let path = request.uri().path().to_string();

        let result = limiter.check(&client_ip, &path).await?;

        let mut response = next.run(request).await;
        limiter.add_rate_limit_headers(&mut response, &result);

        Ok(response)
    }

    fn add_rate_limit_headers(&self, response: &mut Response, result: &WindowCount) {
        let headers = response.headers_mut();

        if let Ok(value) = HeaderValue::from_str(&self.max_requests.to_string()) {
            headers.insert(HeaderName::from_static("x-ratelimit-limit"), value);
        }

        let remaining = self.max_requests.saturating_sub(result.count);
        if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
            headers.insert(HeaderName::from_static("x-ratelimit-remaining"), value);
        }

        if let Ok(value) = HeaderValue::from_str(&result.resets_in.as_secs().to_string()) {
            headers.insert(HeaderName::from_static("x-ratelimit-reset"), value);
        }
    }
}

/// Client IP from the TCP peer address
fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
