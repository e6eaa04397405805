//! HTTP metrics middleware backed by a Prometheus registry
//!
//! Tracks request counts, latencies and in-flight requests. Paths are grouped
//! by their base endpoint so `/api/users/42` and `/api/users/7` share series.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::error::{Error, Result};

/// Metric name suffixes appended to the service prefix
pub mod metric_names {
    /// Total HTTP requests
    pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
    /// HTTP request duration
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
    /// Requests currently in flight
    pub const ACTIVE_REQUESTS: &str = "active_requests";
}

/// Collapse a request path to its base endpoint
///
/// `/api/users/123` becomes `/api/users`. Paths outside `/api/<name>` are
/// returned unchanged.
pub fn base_endpoint(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() >= 3 && parts[1] == "api" {
        return format!("/{}/{}", parts[1], parts[2]);
    }
    path.to_string()
}

/// Prometheus HTTP metrics for one service
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    active_requests: IntGauge,
}

impl HttpMetrics {
    /// Create and register the HTTP metrics under `prefix`
    ///
    /// With prefix `gateway` the series are `gateway_http_requests_total`,
    /// `gateway_http_request_duration_seconds` and `gateway_active_requests`.
    pub fn new(prefix: &str, registry: Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                format!("{}_{}", prefix, metric_names::HTTP_REQUESTS_TOTAL),
                "Total HTTP requests",
            ),
            &["method", "endpoint", "status"],
        )
        .map_err(metrics_error)?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                format!("{}_{}", prefix, metric_names::HTTP_REQUEST_DURATION_SECONDS),
                "HTTP request duration",
            ),
            &["method", "endpoint"],
        )
        .map_err(metrics_error)?;

        let active_requests = IntGauge::new(
            format!("{}_{}", prefix, metric_names::ACTIVE_REQUESTS),
            "Active requests",
        )
        .map_err(metrics_error)?;

        registry
            .register(Box::new(requests_total.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(request_duration.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(active_requests.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            active_requests,
        })
    }

    /// Registry the metrics were registered with
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Middleware recording every request passing through the router
    pub async fn middleware(State(metrics): State<Self>, request: Request, next: Next) -> Response {
        let method = request.method().as_str().to_string();
        let endpoint = base_endpoint(request.uri().path());

        let _in_flight = InFlight::enter(&metrics.active_requests);
        let started = Instant::now();

        let response = next.run(request).await;

        let elapsed = started.elapsed().as_secs_f64();
        metrics
            .requests_total
            .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
            .inc();
        metrics
            .request_duration
            .with_label_values(&[method.as_str(), endpoint.as_str()])
            .observe(elapsed);

        response
    }

    /// Encode every metric in the registry in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| Error::Internal(e.to_string()))
    }
}

/// Holds one unit of the in-flight gauge until dropped, so a request whose
/// future is cancelled still leaves the gauge
struct InFlight(IntGauge);

impl InFlight {
    fn enter(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// `/metrics` handler
pub async fn metrics_handler(State(metrics): State<HttpMetrics>) -> Result<Response> {
    let body = metrics.render()?;
    Ok((
        [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
        body,
    )
        .into_response())
}

fn metrics_error(e: impl std::fmt::Display) -> Error {
    Error::Internal(format!("metrics: {}", e))
}
