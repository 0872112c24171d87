//! Maps service failures and extractor rejections onto the error envelope.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::ForumError;
use thiserror::Error;
use tracing::{error, warn};

use crate::envelope::ErrorEnvelope;

pub const GENERIC_INTERNAL_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Forum(#[from] ForumError),

    /// A path parameter, query string or body that could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    /// An empty listing or a path no route matches.
    #[error("{0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("{0}")]
    MethodNotAllowed(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Marks a response whose body carries server-side detail.
#[derive(Debug, Clone, Copy)]
pub struct InternalDetail;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Forum(err) => match err {
                ForumError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                ForumError::DuplicateTitle(_) => StatusCode::CONFLICT,
                ForumError::NotFound { .. } => StatusCode::NOT_FOUND,
                ForumError::Unauthorized(_) => StatusCode::FORBIDDEN,
                ForumError::Validation(_) => StatusCode::BAD_REQUEST,
                ForumError::LogFailure(_) | ForumError::Database(_) | ForumError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// The text shown to the client, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::MethodNotAllowed(msg) => msg.clone(),
            Self::Forum(err) => match err {
                ForumError::NotFound { .. } => err.to_string(),
                ForumError::RateLimited(msg)
                | ForumError::DuplicateTitle(msg)
                | ForumError::Unauthorized(msg)
                | ForumError::LogFailure(msg)
                | ForumError::Database(msg)
                | ForumError::Validation(msg)
                | ForumError::Internal(msg) => msg.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }

        let body = ErrorEnvelope {
            status_code: status.as_u16(),
            message,
        };
        let mut response = (status, Json(body)).into_response();
        if status.is_server_error() {
            response.extensions_mut().insert(InternalDetail);
        }
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
