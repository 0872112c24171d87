//! rusty-forum/crates/api-adapters/src/http/middleware.rs Middleware
//!
//! Request metrics, error envelopes for layer-generated responses, error
//! redaction and the CORS policy.

use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};

use super::error::{InternalDetail, GENERIC_INTERNAL_MESSAGE};
use super::AppState;
use crate::envelope::ErrorEnvelope;

/// Counts every routed request by method, route template and status.
pub async fn track_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let response = next.run(req).await;
    state
        .metrics
        .observe_request(&method, &route, response.status().as_u16(), started.elapsed());
    response
}

/// Replaces server-side detail with a generic message unless configured otherwise.
pub async fn redact_internal_errors(State(state): State<AppState>, response: Response) -> Response {
    if state.expose_internal_errors || response.extensions().get::<InternalDetail>().is_none() {
        return response;
    }
    let status = response.status();
    let body = ErrorEnvelope {
        status_code: status.as_u16(),
        message: GENERIC_INTERNAL_MESSAGE.to_owned(),
    };
    let mut redacted = (status, Json(body)).into_response();
    redacted.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    redacted
}

/// Gives bodiless error responses from outer layers (e.g. the request
/// timeout) the same `{statusCode, message}` envelope as handler errors.
pub async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    if !is_error || response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }
    let message = match status {
        StatusCode::REQUEST_TIMEOUT => "The request took too long to complete.",
        other => other.canonical_reason().unwrap_or("Request failed"),
    };
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = ErrorEnvelope {
        status_code: status.as_u16(),
        message: message.to_owned(),
    };
    (parts, Json(body)).into_response()
}

/// Configures CORS (Cross-Origin Resource Sharing)
pub fn cors_policy() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
