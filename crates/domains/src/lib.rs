//! rusty-forum/crates/domains/src/lib.rs
//!
//! The central domain types and interface definitions for Rusty-Forum.
//! Nothing in here performs I/O; adapters implement the traits in [`traits`].

pub mod error;
pub mod filters;
pub mod ids;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use filters::*;
pub use ids::*;
pub use models::*;
pub use traits::*;
