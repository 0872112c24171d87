use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{LogAction, LogEntry, LogFilter, LogId, LogRecord, LogRepository, TargetModel};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

const COLUMNS: &str = "id, user_id, action, target_id, target_model, is_success, details, created_at";

pub struct PgLogRepo {
    pool: PgPool,
}

impl PgLogRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn from_row(row: &PgRow) -> anyhow::Result<LogRecord> {
    let action: String = row.try_get("action")?;
    let model: String = row.try_get("target_model")?;
    Ok(LogRecord {
        id: LogId(row.try_get("id")?),
        user_id: row.try_get::<Option<Uuid>, _>("user_id")?.map(Into::into),
        action: action.parse::<LogAction>().map_err(anyhow::Error::msg)?,
        target_id: row.try_get("target_id")?,
        target_model: model.parse::<TargetModel>().map_err(anyhow::Error::msg)?,
        is_success: row.try_get("is_success")?,
        details: row.try_get("details")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl LogRepository for PgLogRepo {
    async fn insert(
        &self,
        entry: LogEntry,
        id: LogId,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<LogRecord> {
        let row = sqlx::query(&format!(
            "INSERT INTO audit_logs ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(entry.user_id.map(|a| a.as_uuid()))
        .bind(entry.action.as_str())
        .bind(entry.target_id)
        .bind(entry.target_model.as_str())
        .bind(entry.is_success)
        .bind(entry.details)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        from_row(&row)
    }

    async fn find(&self, filter: LogFilter) -> anyhow::Result<Vec<LogRecord>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM audit_logs WHERE TRUE"));
        if let Some(action) = filter.action {
            qb.push(" AND action = ").push_bind(action.as_str());
        }
        if let Some(model) = filter.target_model {
            qb.push(" AND target_model = ").push_bind(model.as_str());
        }
        if let Some(target) = filter.target_id {
            qb.push(" AND target_id = ").push_bind(target);
        }
        qb.push(" ORDER BY seq");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(from_row).collect()
    }

    async fn clear(&self) -> anyhow::Result<u64> {
        let done = sqlx::query("DELETE FROM audit_logs").execute(&self.pool).await?;
        Ok(done.rows_affected())
    }
}
