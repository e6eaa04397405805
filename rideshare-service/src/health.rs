//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,
}

/// Identity reported by the probes
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    name: Arc<str>,
    version: &'static str,
}

impl ServiceInfo {
    /// Create service info for the probes
    pub fn new(name: impl Into<String>, version: &'static str) -> Self {
        Self {
            name: Arc::from(name.into()),
            version,
        }
    }
}

/// Simple health check (liveness probe)
///
/// Always returns 200 OK if the service is running.
pub async fn health(State(info): State<ServiceInfo>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: info.name.to_string(),
        version: Some(info.version.to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check (readiness probe)
///
/// In-memory services have no dependencies to wait on, so this reports
/// ready as soon as the listener accepts connections.
pub async fn readiness(State(info): State<ServiceInfo>) -> impl IntoResponse {
    let response = ReadinessResponse {
        ready: true,
        service: info.name.to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// `/health` and `/ready` routes, mergeable into any service router
pub fn health_routes<S>(info: ServiceInfo) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .with_state(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_service() {
        let app: Router = health_routes(ServiceInfo::new("user-service", "0.1.0"));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: HealthResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "user-service");
        assert_eq!(body.version.as_deref(), Some("0.1.0"));
    }

    #[tokio::test]
    async fn test_readiness() {
        let app: Router = health_routes(ServiceInfo::new("api-gateway", "0.1.0"));

        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: ReadinessResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.ready);
        assert_eq!(body.service, "api-gateway");
    }
}
