//! # PostgreSQL backend
//!
//! Runtime-checked `sqlx` queries against the schema in `migrations/`.
//! Counter changes and attach/detach are single `UPDATE ... RETURNING`
//! statements, so concurrent writers never lose increments.

mod logs;
mod problems;
mod solutions;

pub use logs::PgLogRepo;
pub use problems::PgProblemRepo;
pub use solutions::PgSolutionRepo;

use anyhow::Context;
use domains::ForumError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::info;

/// The three repositories sharing one pool.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
    pub problems: Arc<PgProblemRepo>,
    pub solutions: Arc<PgSolutionRepo>,
    pub logs: Arc<PgLogRepo>,
}

impl PgStore {
    /// Opens the pool and applies pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("connect to postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
        info!(max_connections, "postgres pool ready");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            problems: Arc::new(PgProblemRepo::new(pool.clone())),
            solutions: Arc::new(PgSolutionRepo::new(pool.clone())),
            logs: Arc::new(PgLogRepo::new(pool.clone())),
            pool,
        }
    }
}

/// Stored counters are `BIGINT` with a non-negative check.
fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_column(value: u64) -> anyhow::Result<i64> {
    i64::try_from(value).context("counter exceeds BIGINT range")
}

/// Unique index over the normalised problem title.
const TITLE_INDEX: &str = "problems_title_unique_idx";

/// Turns a violation of [`TITLE_INDEX`] into `DuplicateTitle`.
fn title_conflict(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() && db.constraint() == Some(TITLE_INDEX) => {
            ForumError::DuplicateTitle("A problem with a similar title already exists.".into()).into()
        }
        _ => err.into(),
    }
}

/// Escapes `%`, `_` and the escape character itself for use in `ILIKE`.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
