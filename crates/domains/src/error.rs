//! # ForumError
//!
//! Centralized error handling for the Rusty-Forum services.
//! Every failure a caller can observe is one of these variants; the HTTP
//! layer maps them to status codes.

use thiserror::Error;

/// The primary error type for all service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForumError {
    /// The actor performed the same action again inside the limiter window.
    #[error("too many requests: {0}")]
    RateLimited(String),

    /// A problem with the same title already exists.
    #[error("duplicate problem: {0}")]
    DuplicateTitle(String),

    /// Referenced entity is absent (e.g., Problem, Solution)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor does not own the entity it tries to mutate.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The audit write failed; any compensation outcome is part of the message.
    #[error("log failure: {0}")]
    LogFailure(String),

    /// Wrapped persistence failure.
    #[error("database error: {0}")]
    Database(String),

    /// Input rejected before any write was attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wiring or invariant failure inside the process.
    #[error("internal service error: {0}")]
    Internal(String),
}

impl ForumError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wraps an adapter error, keeping the whole cause chain in the message.
    /// A `ForumError` raised by the adapter itself passes through unchanged.
    pub fn database(context: impl AsRef<str>, error: &anyhow::Error) -> Self {
        if let Some(domain) = error.downcast_ref::<ForumError>() {
            return domain.clone();
        }
        Self::Database(format!("{}: {error:#}", context.as_ref()))
    }

    /// True for failures caused by the server rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::LogFailure(_) | Self::Database(_) | Self::Internal(_))
    }
}

/// A specialized Result type for Rusty-Forum logic.
pub type Result<T> = std::result::Result<T, ForumError>;
