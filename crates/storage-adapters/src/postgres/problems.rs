use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Problem, ProblemCounter, ProblemFilter, ProblemId, ProblemPatch, ProblemRepository,
    ProblemStatus, SolutionId, TitleMatch,
};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{escape_like, title_conflict, to_column, to_count};

const COLUMNS: &str = "id, title, details, try_and_expect, tags, status, up_votes, down_votes, \
                       views, solution_count, solutions, created_by, created_at, updated_at";

pub struct PgProblemRepo {
    pool: PgPool,
}

impl PgProblemRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> anyhow::Result<Problem> {
    let status: String = row.try_get("status")?;
    let solutions: Vec<Uuid> = row.try_get("solutions")?;
    Ok(Problem {
        id: ProblemId(row.try_get("id")?),
        title: row.try_get("title")?,
        details: row.try_get("details")?,
        try_and_expect: row.try_get("try_and_expect")?,
        tags: row.try_get("tags")?,
        status: status.parse::<ProblemStatus>().map_err(anyhow::Error::msg)?,
        up_votes: to_count(row.try_get("up_votes")?),
        down_votes: to_count(row.try_get("down_votes")?),
        views: to_count(row.try_get("views")?),
        solution_count: to_count(row.try_get("solution_count")?),
        solutions: solutions.into_iter().map(SolutionId).collect(),
        created_by: row.try_get::<Uuid, _>("created_by")?.into(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn optional(row: Option<PgRow>) -> anyhow::Result<Option<Problem>> {
    row.as_ref().map(from_row).transpose()
}

/// Full-row upsert; also used by `insert` without the conflict clause.
fn write_sql(on_conflict: bool) -> String {
    let mut sql = format!(
        "INSERT INTO problems ({COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
    );
    if on_conflict {
        sql.push_str(
            " ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, details = EXCLUDED.details, \
             try_and_expect = EXCLUDED.try_and_expect, tags = EXCLUDED.tags, \
             status = EXCLUDED.status, up_votes = EXCLUDED.up_votes, \
             down_votes = EXCLUDED.down_votes, views = EXCLUDED.views, \
             solution_count = EXCLUDED.solution_count, solutions = EXCLUDED.solutions, \
             created_by = EXCLUDED.created_by, created_at = EXCLUDED.created_at, \
             updated_at = EXCLUDED.updated_at",
        );
    }
    sql.push_str(&format!(" RETURNING {COLUMNS}"));
    sql
}

impl PgProblemRepo {
    async fn write(&self, problem: &Problem, on_conflict: bool) -> anyhow::Result<Problem> {
        let solutions: Vec<Uuid> = problem.solutions.iter().map(|s| s.as_uuid()).collect();
        let row = sqlx::query(&write_sql(on_conflict))
            .bind(problem.id.as_uuid())
            .bind(&problem.title)
            .bind(&problem.details)
            .bind(&problem.try_and_expect)
            .bind(&problem.tags)
            .bind(problem.status.as_str())
            .bind(to_column(problem.up_votes)?)
            .bind(to_column(problem.down_votes)?)
            .bind(to_column(problem.views)?)
            .bind(to_column(problem.solution_count)?)
            .bind(solutions)
            .bind(problem.created_by.as_uuid())
            .bind(problem.created_at)
            .bind(problem.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(title_conflict)?;
        from_row(&row)
    }
}

#[async_trait]
impl ProblemRepository for PgProblemRepo {
    async fn insert(&self, problem: Problem) -> anyhow::Result<Problem> {
        self.write(&problem, false).await
    }

    async fn find_by_id(&self, id: ProblemId) -> anyhow::Result<Option<Problem>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM problems WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        optional(row)
    }

    async fn find(&self, filter: ProblemFilter) -> anyhow::Result<Vec<Problem>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM problems WHERE TRUE"));
        match &filter.title {
            Some(TitleMatch::Exact(title)) => {
                qb.push(" AND lower(btrim(title)) = lower(")
                    .push_bind(title.trim().to_string())
                    .push(")");
            }
            Some(TitleMatch::Contains(needle)) => {
                qb.push(" AND title ILIKE ")
                    .push_bind(format!("%{}%", escape_like(needle.trim())))
                    .push(" ESCAPE '\\'");
            }
            None => {}
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(actor) = filter.created_by {
            qb.push(" AND created_by = ").push_bind(actor.as_uuid());
        }
        qb.push(" ORDER BY created_at, id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(from_row).collect()
    }

    async fn update(
        &self,
        id: ProblemId,
        patch: ProblemPatch,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Problem>> {
        let row = sqlx::query(&format!(
            "UPDATE problems SET \
               title = COALESCE(btrim($2), title), \
               details = COALESCE($3, details), \
               try_and_expect = COALESCE($4, try_and_expect), \
               tags = COALESCE($5, tags), \
               status = COALESCE($6, status), \
               updated_at = $7 \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(patch.title)
        .bind(patch.details)
        .bind(patch.try_and_expect)
        .bind(patch.tags)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(title_conflict)?;
        optional(row)
    }

    async fn replace(&self, problem: Problem) -> anyhow::Result<Problem> {
        self.write(&problem, true).await
    }

    async fn delete(&self, id: ProblemId) -> anyhow::Result<Option<Problem>> {
        let row = sqlx::query(&format!("DELETE FROM problems WHERE id = $1 RETURNING {COLUMNS}"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        optional(row)
    }

    async fn increment(
        &self,
        id: ProblemId,
        counter: ProblemCounter,
        delta: i64,
    ) -> anyhow::Result<Option<Problem>> {
        let column = counter.column();
        let row = sqlx::query(&format!(
            "UPDATE problems SET {column} = GREATEST({column} + $2, 0) \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        optional(row)
    }

    async fn attach_solution(
        &self,
        id: ProblemId,
        solution: SolutionId,
    ) -> anyhow::Result<Option<Problem>> {
        let row = sqlx::query(&format!(
            "UPDATE problems SET \
               solutions = CASE WHEN $2 = ANY(solutions) THEN solutions \
                                ELSE array_append(solutions, $2) END, \
               solution_count = CASE WHEN $2 = ANY(solutions) THEN solution_count \
                                     ELSE solution_count + 1 END \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(solution.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        optional(row)
    }

    async fn detach_solution(
        &self,
        id: ProblemId,
        solution: SolutionId,
    ) -> anyhow::Result<Option<Problem>> {
        let row = sqlx::query(&format!(
            "UPDATE problems SET \
               solutions = array_remove(solutions, $2), \
               solution_count = CASE WHEN $2 = ANY(solutions) \
                                     THEN GREATEST(solution_count - 1, 0) \
                                     ELSE solution_count END \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(solution.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        optional(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_is_an_upsert() {
        let sql = write_sql(true);
        assert!(sql.contains("ON CONFLICT (id) DO UPDATE"));
        assert!(sql.ends_with(&format!("RETURNING {COLUMNS}")));
        assert!(!write_sql(false).contains("ON CONFLICT"));
    }
}
