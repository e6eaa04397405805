//! User directory service
//!
//! Keeps an ordered list of users in process memory and exposes
//! list/get/create/update/delete over HTTP with JSON bodies under
//! `/api/users`. Nothing is persisted; the list resets to its seed users on
//! every restart.

pub mod config;
pub mod handlers;
pub mod models;
pub mod store;

use rideshare_service::prelude::*;

pub use config::{UserServiceConfig, UserServiceSettings};
pub use models::User;
pub use store::{IdStrategy, UserStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: UserStore,
}

impl AppState {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }
}

/// Build the service router with user routes and health probes
pub fn router(state: AppState, service_name: &str) -> Router {
    Router::new()
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .merge(health_routes(ServiceInfo::new(
            service_name,
            env!("CARGO_PKG_VERSION"),
        )))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        app_with(IdStrategy::Length)
    }

    fn app_with(strategy: IdStrategy) -> Router {
        router(AppState::new(UserStore::seeded(strategy)), "user-service")
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_list_returns_seed_users() {
        let (status, body) = send(&app(), "GET", "/api/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "id": 1, "name": "John Doe", "email": "john@example.com" },
                { "id": 2, "name": "Jane Smith", "email": "jane@example.com" }
            ])
        );
    }

    #[tokio::test]
    async fn test_get_seed_user() {
        let (status, body) = send(&app(), "GET", "/api/users/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "id": 1, "name": "John Doe", "email": "john@example.com" })
        );
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let (status, body) = send(&app(), "GET", "/api/users/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "User not found" }));

        let (status, body) = send(&app(), "GET", "/api/users/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "User not found" }));
    }

    #[tokio::test]
    async fn test_create_without_email() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/users", Some(json!({ "name": "X" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Name and email required" }));

        let (_, users) = send(&app, "GET", "/api/users", None).await;
        assert_eq!(users.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_with_unreadable_body() {
        let app = app();
        let request = Request::post("/api/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) =
            send(&app, "POST", "/api/users", Some(json!({ "name": 5, "email": "x@y.z" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Name and email required" }));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let app = app();
        let (status, created) = send(
            &app,
            "POST",
            "/api/users",
            Some(json!({ "name": "Ann Lee", "email": "ann@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 3);

        let uri = format!("/api/users/{}", created["id"]);
        let (status, fetched) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_grows_with_creates() {
        let app = app();
        let mut previous = 2;
        for i in 0..3 {
            let (_, created) = send(
                &app,
                "POST",
                "/api/users",
                Some(json!({ "name": format!("User {}", i), "email": format!("u{}@example.com", i) })),
            )
            .await;
            assert_eq!(created["id"], previous + 1);

            let (_, users) = send(&app, "GET", "/api/users", None).await;
            let count = users.as_array().unwrap().len();
            assert_eq!(count, previous as usize + 1);
            previous += 1;
        }
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let app = app();
        let (status, body) =
            send(&app, "PUT", "/api/users/2", Some(json!({ "name": "Jane X" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "id": 2, "name": "Jane X", "email": "jane@example.com" })
        );

        let (_, fetched) = send(&app, "GET", "/api/users/2", None).await;
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let (status, body) =
            send(&app(), "PUT", "/api/users/999", Some(json!({ "name": "Nobody" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "User not found" }));
    }

    #[tokio::test]
    async fn test_update_without_body() {
        let app = app();
        let (status, body) = send(&app, "PUT", "/api/users/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "User not found" }));

        let (status, body) = send(&app, "PUT", "/api/users/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "id": 2, "name": "Jane Smith", "email": "jane@example.com" })
        );
    }

    #[tokio::test]
    async fn test_update_with_unreadable_body() {
        let app = app();
        let put = |uri: &str| {
            Request::put(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap()
        };

        let response = app.clone().oneshot(put("/api/users/999")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.clone().oneshot(put("/api/users/2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (_, fetched) = send(&app, "GET", "/api/users/2", None).await;
        assert_eq!(fetched["name"], "Jane Smith");
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_success() {
        let app = app();
        let (status, body) = send(&app, "DELETE", "/api/users/999", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "User deleted successfully" }));

        let (_, users) = send(&app, "GET", "/api/users", None).await;
        assert_eq!(users.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_after_delete_duplicates_id() {
        let app = app();
        let (status, _) = send(&app, "DELETE", "/api/users/1", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, created) = send(
            &app,
            "POST",
            "/api/users",
            Some(json!({ "name": "Ann", "email": "ann@example.com" })),
        )
        .await;
        // Count is 1 after the delete, so the new id collides with Jane's
        assert_eq!(created["id"], 2);

        let (_, users) = send(&app, "GET", "/api/users", None).await;
        let ids: Vec<i64> = users
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 2]);
    }

    #[tokio::test]
    async fn test_sequence_strategy_avoids_duplicates() {
        let app = app_with(IdStrategy::Sequence);
        send(&app, "DELETE", "/api/users/1", None).await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/users",
            Some(json!({ "name": "Ann", "email": "ann@example.com" })),
        )
        .await;
        assert_eq!(created["id"], 3);
    }

    #[tokio::test]
    async fn test_health_probe() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "user-service");
    }
}
