//! rusty-forum/crates/api-adapters/src/lib.rs
//!
//! HTTP surface of the forum. The JSON envelopes and the metrics registry
//! are framework-agnostic; the Axum router lives behind `web-axum`.

pub mod envelope;
pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod http;

pub use envelope::{ErrorEnvelope, SuccessEnvelope};
pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use http::{router, AppState};
