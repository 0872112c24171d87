//! Liveness and metrics endpoints, plus the router fallbacks.

use axum::extract::{OriginalUri, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::{ApiError, AppState, Envelope};
use crate::metrics::CONTENT_TYPE;
use domains::ForumError;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn health() -> Envelope<Health> {
    Envelope::ok("Service is healthy", Health { status: "ok" })
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    state
        .metrics
        .set_rate_limiter_entries(state.services.limiter.tracked());
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => ApiError::from(ForumError::Internal(format!("failed to encode metrics: {e}")))
            .into_response(),
    }
}

/// Answers paths no route matches.
pub async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Cannot {method} {}", uri.path()))
}

/// Answers known paths requested with an unsupported method.
pub async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::MethodNotAllowed(format!("Method {method} is not allowed on {}", uri.path()))
}
