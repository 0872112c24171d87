//! # Core Traits (Ports)
//!
//! Any persistence engine must implement these traits to be used by the binary.
//! "Not found" is always `Ok(None)`; `Err` is reserved for connectivity and
//! constraint failures, which the services wrap into `ForumError::Database`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::filters::{LogFilter, ProblemFilter};
use crate::ids::{ActorId, LogId, ProblemId, SolutionId};
use crate::models::{
    LogEntry, LogRecord, Problem, ProblemCounter, ProblemPatch, Solution, SolutionCounter,
    SolutionPatch,
};

/// Data persistence contract for problems.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProblemRepository: Send + Sync {
    async fn insert(&self, problem: Problem) -> anyhow::Result<Problem>;
    async fn find_by_id(&self, id: ProblemId) -> anyhow::Result<Option<Problem>>;
    async fn find(&self, filter: ProblemFilter) -> anyhow::Result<Vec<Problem>>;
    /// Applies the patch and returns the document after the update.
    async fn update(
        &self,
        id: ProblemId,
        patch: ProblemPatch,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Problem>>;
    /// Writes a full snapshot back, inserting it if it no longer exists.
    /// Used to undo an update or a delete.
    async fn replace(&self, problem: Problem) -> anyhow::Result<Problem>;
    /// Removes the document and returns what was removed.
    async fn delete(&self, id: ProblemId) -> anyhow::Result<Option<Problem>>;
    /// Atomically adds `delta` to one counter; the result never drops below zero.
    async fn increment(
        &self,
        id: ProblemId,
        counter: ProblemCounter,
        delta: i64,
    ) -> anyhow::Result<Option<Problem>>;
    /// Appends the reference (if absent) and bumps `solution_count` in one update.
    async fn attach_solution(
        &self,
        id: ProblemId,
        solution: SolutionId,
    ) -> anyhow::Result<Option<Problem>>;
    /// Removes the reference (if present) and lowers `solution_count` in one update.
    async fn detach_solution(
        &self,
        id: ProblemId,
        solution: SolutionId,
    ) -> anyhow::Result<Option<Problem>>;
}

/// Data persistence contract for solutions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SolutionRepository: Send + Sync {
    async fn insert(&self, solution: Solution) -> anyhow::Result<Solution>;
    async fn find_by_id(&self, id: SolutionId) -> anyhow::Result<Option<Solution>>;
    /// All solutions of one problem, oldest first.
    async fn find_by_problem(&self, problem_id: ProblemId) -> anyhow::Result<Vec<Solution>>;
    async fn update(
        &self,
        id: SolutionId,
        patch: SolutionPatch,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Solution>>;
    async fn replace(&self, solution: Solution) -> anyhow::Result<Solution>;
    async fn delete(&self, id: SolutionId) -> anyhow::Result<Option<Solution>>;
    /// Returns the number of removed documents.
    async fn delete_by_problem(&self, problem_id: ProblemId) -> anyhow::Result<u64>;
    async fn increment(
        &self,
        id: SolutionId,
        counter: SolutionCounter,
        delta: i64,
    ) -> anyhow::Result<Option<Solution>>;
}

/// Append-only audit store.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LogRepository: Send + Sync {
    async fn insert(
        &self,
        entry: LogEntry,
        id: LogId,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<LogRecord>;
    /// Matching records in insertion order.
    async fn find(&self, filter: LogFilter) -> anyhow::Result<Vec<LogRecord>>;
    /// Deletes every record and returns how many were removed.
    async fn clear(&self) -> anyhow::Result<u64>;
}

/// Identity provider for the actor behind the current operation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ActorContext: Send + Sync {
    fn current_actor(&self) -> ActorId;
}

/// Time source, swappable in tests.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
