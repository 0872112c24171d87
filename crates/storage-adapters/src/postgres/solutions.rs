use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{ProblemId, Solution, SolutionCounter, SolutionId, SolutionPatch, SolutionRepository};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use super::{to_column, to_count};

const COLUMNS: &str =
    "id, problem_id, details, up_votes, down_votes, created_by, is_accepted, created_at, updated_at";

pub struct PgSolutionRepo {
    pool: PgPool,
}

impl PgSolutionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> anyhow::Result<Solution> {
    Ok(Solution {
        id: SolutionId(row.try_get("id")?),
        problem_id: ProblemId(row.try_get("problem_id")?),
        details: row.try_get("details")?,
        up_votes: to_count(row.try_get("up_votes")?),
        down_votes: to_count(row.try_get("down_votes")?),
        created_by: row.try_get::<Uuid, _>("created_by")?.into(),
        is_accepted: row.try_get("is_accepted")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn optional(row: Option<PgRow>) -> anyhow::Result<Option<Solution>> {
    row.as_ref().map(from_row).transpose()
}

impl PgSolutionRepo {
    async fn write(&self, solution: &Solution, on_conflict: bool) -> anyhow::Result<Solution> {
        let conflict = if on_conflict {
            " ON CONFLICT (id) DO UPDATE SET problem_id = EXCLUDED.problem_id, \
              details = EXCLUDED.details, up_votes = EXCLUDED.up_votes, \
              down_votes = EXCLUDED.down_votes, created_by = EXCLUDED.created_by, \
              is_accepted = EXCLUDED.is_accepted, created_at = EXCLUDED.created_at, \
              updated_at = EXCLUDED.updated_at"
        } else {
            ""
        };
        let row = sqlx::query(&format!(
            "INSERT INTO solutions ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)\
             {conflict} RETURNING {COLUMNS}"
        ))
        .bind(solution.id.as_uuid())
        .bind(solution.problem_id.as_uuid())
        .bind(&solution.details)
        .bind(to_column(solution.up_votes)?)
        .bind(to_column(solution.down_votes)?)
        .bind(solution.created_by.as_uuid())
        .bind(solution.is_accepted)
        .bind(solution.created_at)
        .bind(solution.updated_at)
        .fetch_one(&self.pool)
        .await?;
        from_row(&row)
    }
}

#[async_trait]
impl SolutionRepository for PgSolutionRepo {
    async fn insert(&self, solution: Solution) -> anyhow::Result<Solution> {
        self.write(&solution, false).await
    }

    async fn find_by_id(&self, id: SolutionId) -> anyhow::Result<Option<Solution>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM solutions WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        optional(row)
    }

    async fn find_by_problem(&self, problem_id: ProblemId) -> anyhow::Result<Vec<Solution>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM solutions WHERE problem_id = $1 ORDER BY created_at, id"
        ))
        .bind(problem_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(from_row).collect()
    }

    async fn update(
        &self,
        id: SolutionId,
        patch: SolutionPatch,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Solution>> {
        let row = sqlx::query(&format!(
            "UPDATE solutions SET details = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(patch.details)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;
        optional(row)
    }

    async fn replace(&self, solution: Solution) -> anyhow::Result<Solution> {
        self.write(&solution, true).await
    }

    async fn delete(&self, id: SolutionId) -> anyhow::Result<Option<Solution>> {
        let row = sqlx::query(&format!("DELETE FROM solutions WHERE id = $1 RETURNING {COLUMNS}"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        optional(row)
    }

    async fn delete_by_problem(&self, problem_id: ProblemId) -> anyhow::Result<u64> {
        let done = sqlx::query("DELETE FROM solutions WHERE problem_id = $1")
            .bind(problem_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn increment(
        &self,
        id: SolutionId,
        counter: SolutionCounter,
        delta: i64,
    ) -> anyhow::Result<Option<Solution>> {
        let column = counter.column();
        let row = sqlx::query(&format!(
            "UPDATE solutions SET {column} = GREATEST({column} + $2, 0) \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        optional(row)
    }
}
