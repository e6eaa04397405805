//! Reverse proxy to the user service
//!
//! Requests are forwarded with their method, headers and (for POST and PUT)
//! body. The upstream status, body and content type come back unchanged, so
//! upstream errors such as 404 reach the client as the upstream wrote them.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use rideshare_service::{Error, Result};
use tracing::{debug, field, warn, Instrument, Span};

use crate::AppState;

/// Forward a `/api/users` request to the user service
pub async fn proxy_users(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    if !matches!(method, Method::GET | Method::POST | Method::PUT | Method::DELETE) {
        return Err(Error::MethodNotAllowed);
    }

    let url = upstream_url(&state.users_url, &method, &uri);
    let span = tracing::info_span!(
        "proxy_request",
        http.url = %url,
        http.method = %method,
        http.status_code = field::Empty,
    );

    forward(&state, method, url, headers, body)
        .instrument(span)
        .await
}

async fn forward(
    state: &AppState,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    debug!("Proxying {} {}", method, url);

    let sends_body = matches!(method, Method::POST | Method::PUT);
    let mut request = state
        .client
        .request(method, &url)
        .headers(forwarded_headers(headers));
    if sends_body {
        request = request.body(body);
    }

    let upstream = request.send().await.map_err(|e| {
        warn!("Upstream request to {} failed: {}", url, e);
        Error::ServiceUnavailable(e.to_string())
    })?;

    let status = upstream.status();
    Span::current().record("http.status_code", status.as_u16());

    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = upstream.bytes().await.map_err(|e| {
        warn!("Reading upstream response from {} failed: {}", url, e);
        Error::ServiceUnavailable(e.to_string())
    })?;

    let mut response = (status, bytes).into_response();
    match content_type {
        Some(value) => {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        None => {
            response.headers_mut().remove(header::CONTENT_TYPE);
        }
    }

    Ok(response)
}

/// Upstream URL for a gateway request
///
/// The path is kept as is. Only GET requests carry the query string.
fn upstream_url(base: &str, method: &Method, uri: &Uri) -> String {
    let base = base.trim_end_matches('/');
    match uri.query() {
        Some(query) if *method == Method::GET => format!("{}{}?{}", base, uri.path(), query),
        _ => format!("{}{}", base, uri.path()),
    }
}

/// Drop headers describing the client connection; reqwest sets its own
fn forwarded_headers(mut headers: HeaderMap) -> HeaderMap {
    for name in [
        header::HOST,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::CONNECTION,
    ] {
        headers.remove(name);
    }
    headers
}
