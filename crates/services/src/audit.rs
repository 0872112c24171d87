//! # AuditLog
//!
//! Side-channel observer of every mutation on problems and solutions.
//! Records are append-only; the only destructive operation is [`AuditLog::clear`],
//! which always leaves exactly one trace of itself behind.

use domains::{
    ActorContext, ActorId, Clock, ForumError, LogAction, LogEntry, LogFilter, LogId, LogRecord,
    LogRepository, Result, TargetModel,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::saga::{describe_failures, Saga};

pub const CLEARED_DETAILS: &str = "All logs have been cleared.";

pub struct AuditLog {
    logs: Arc<dyn LogRepository>,
    clock: Arc<dyn Clock>,
    actor: Arc<dyn ActorContext>,
}

impl AuditLog {
    pub fn new(logs: Arc<dyn LogRepository>, clock: Arc<dyn Clock>, actor: Arc<dyn ActorContext>) -> Self {
        Self { logs, clock, actor }
    }

    /// Appends one record. Failure is a `LogFailure`.
    pub async fn record(&self, entry: LogEntry) -> Result<LogRecord> {
        let (action, model) = (entry.action, entry.target_model);
        self.logs
            .insert(entry, LogId::new(), self.clock.now())
            .await
            .map_err(|e| {
                ForumError::LogFailure(format!(
                    "Failed to record the {} of the {}. Error details: {e:#}.",
                    action.noun(),
                    model.as_str().to_lowercase()
                ))
            })
    }

    /// Appends one record; if that fails, rolls the saga back before
    /// reporting. Both the audit error and any compensation errors end up in
    /// the returned `LogFailure`.
    pub async fn record_or_compensate(&self, entry: LogEntry, saga: Saga<'_>) -> Result<LogRecord> {
        let (action, model) = (entry.action, entry.target_model.as_str().to_lowercase());
        let error = match self.logs.insert(entry, LogId::new(), self.clock.now()).await {
            Ok(record) => {
                saga.commit();
                return Ok(record);
            }
            Err(e) => e,
        };

        warn!(saga = saga.name(), error = %format!("{error:#}"), "audit write failed, rolling back");
        let failures = saga.rollback().await;
        if failures.is_empty() {
            Err(ForumError::LogFailure(format!(
                "Failed to record the {} of the {model}. Error details: {error:#}. The change was rolled back.",
                action.noun()
            )))
        } else {
            Err(ForumError::LogFailure(format!(
                "Failed to record the {} of the {model} and rollback the database changes. Original error: {error:#}, Rollback error: {}",
                action.noun(),
                describe_failures(&failures)
            )))
        }
    }

    /// Best-effort failure record. Its own failure is only traced so it can
    /// never mask the error being reported.
    pub async fn record_failure(&self, actor: ActorId, action: LogAction, model: TargetModel, details: String) {
        let entry = LogEntry::failure(actor, action, model, details);
        if let Err(e) = self.logs.insert(entry, LogId::new(), self.clock.now()).await {
            warn!(%action, %model, error = %format!("{e:#}"), "could not record failure entry");
        }
    }

    /// Records `error` as a failed action and hands it back.
    pub async fn reject<T>(
        &self,
        actor: ActorId,
        action: LogAction,
        model: TargetModel,
        error: ForumError,
    ) -> Result<T> {
        self.record_failure(actor, action, model, error.to_string()).await;
        Err(error)
    }

    pub async fn logs(&self, filter: LogFilter) -> Result<Vec<LogRecord>> {
        self.logs.find(filter.clone()).await.map_err(|e| {
            ForumError::LogFailure(format!(
                "Failed to retrieve logs matching {filter:?}. Error details: {e:#}."
            ))
        })
    }

    pub async fn all(&self) -> Result<Vec<LogRecord>> {
        self.logs(LogFilter::default()).await
    }

    /// Deletes every record, then writes a single `CLEAR` record with no target.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self) -> Result<LogRecord> {
        let removed = self.logs.clear().await.map_err(|e| {
            ForumError::LogFailure(format!("Failed to clear all logs. Error details: {e:#}."))
        })?;

        let entry = LogEntry {
            user_id: Some(self.actor.current_actor()),
            action: LogAction::Clear,
            target_id: None,
            target_model: TargetModel::Log,
            is_success: true,
            details: Some(CLEARED_DETAILS.to_string()),
        };
        let record = self.record(entry).await.map_err(|e| {
            ForumError::LogFailure(format!("Failed to record the clearing of all logs. {e}"))
        })?;
        info!(removed, "audit log cleared");
        Ok(record)
    }
}
