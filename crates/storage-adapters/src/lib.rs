//! rusty-forum/crates/storage-adapters/src/lib.rs
//!
//! Persistence engines implementing the repository ports in `domains`.
//! The in-memory backend is always compiled; PostgreSQL sits behind the
//! `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::{FailSwitch, MemoryLogRepo, MemoryProblemRepo, MemorySolutionRepo, MemoryStore};

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
