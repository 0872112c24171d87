//! # Axum router
//!
//! All forum routes live under `/forum`; `/health` and `/metrics` sit at
//! the root.

pub mod error;
pub mod logs;
pub mod middleware;
pub mod problems;
pub mod solutions;
pub mod system;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use services::ForumServices;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::envelope::SuccessEnvelope;
use crate::metrics::Metrics;

pub use error::{ApiError, ApiResult};

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: ForumServices,
    pub metrics: Arc<Metrics>,
    pub request_timeout: Duration,
    /// When false, 5xx bodies are replaced by a generic message.
    pub expose_internal_errors: bool,
}

impl AppState {
    pub fn new(services: ForumServices, metrics: Arc<Metrics>) -> Self {
        Self {
            services,
            metrics,
            request_timeout: Duration::from_secs(30),
            expose_internal_errors: true,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }
}

/// A payload wrapped in the success envelope.
pub struct Envelope<T> {
    status: StatusCode,
    message: &'static str,
    data: T,
}

impl<T> Envelope<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message,
            data,
        }
    }

    pub fn created(message: &'static str, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let body = SuccessEnvelope::new(self.status.as_u16(), self.message, self.data);
        (self.status, Json(body)).into_response()
    }
}

fn forum_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/problem",
            post(problems::create_problem).get(problems::list_problems),
        )
        .route(
            "/problem/{id}",
            get(problems::view_problem)
                .put(problems::update_problem)
                .delete(problems::delete_problem),
        )
        .route(
            "/problem/upvote/{id}/{is_up_vote}",
            post(problems::vote_problem),
        )
        // One pattern serves both the problem-scoped and the solution-scoped verbs.
        .route(
            "/solution/{id}",
            post(solutions::create_solution)
                .get(solutions::list_solutions)
                .put(solutions::update_solution)
                .delete(solutions::delete_solution),
        )
        .route(
            "/solution/upvote/{id}/{is_up_vote}",
            put(solutions::vote_solution),
        )
        .route("/log", get(logs::all_logs).delete(logs::clear_logs))
        .route("/log/search", get(logs::search_logs))
}

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/forum", forum_routes())
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .method_not_allowed_fallback(system::method_not_allowed)
        .fallback(system::route_not_found)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_metrics,
        ))
        .layer(axum::middleware::map_response_with_state(
            state.clone(),
            middleware::redact_internal_errors,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    state.request_timeout,
                ))
                .layer(middleware::cors_policy()),
        )
        .layer(axum::middleware::map_response(middleware::envelope_bare_errors))
        .with_state(state)
}
