//! # In-memory backend
//!
//! `DashMap` collections for problems and solutions and an append-only
//! vector for the audit log. Every single-document operation runs under
//! the entry's shard lock, so increments and attach/detach are atomic the
//! same way the SQL backend's single-statement updates are.

use anyhow::bail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{
    LogEntry, LogFilter, LogId, LogRecord, LogRepository, Problem, ProblemCounter, ProblemFilter,
    ProblemId, ProblemPatch, ProblemRepository, Solution, SolutionCounter, SolutionId,
    SolutionPatch, SolutionRepository,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// Makes every write of one collection fail until switched off.
#[derive(Debug, Default)]
pub struct FailSwitch {
    name: &'static str,
    armed: AtomicBool,
}

impl FailSwitch {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            armed: AtomicBool::new(false),
        }
    }

    pub fn set(&self, fail: bool) {
        self.armed.store(fail, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.is_set() {
            bail!("{} store rejected the write", self.name);
        }
        Ok(())
    }
}

// ── Problems ────────────────────────────────────────────────────────────────

pub struct MemoryProblemRepo {
    docs: DashMap<ProblemId, Problem>,
    fail_writes: FailSwitch,
}

impl Default for MemoryProblemRepo {
    fn default() -> Self {
        Self {
            docs: DashMap::new(),
            fail_writes: FailSwitch::new("problem"),
        }
    }
}

impl MemoryProblemRepo {
    pub fn fail_writes(&self) -> &FailSwitch {
        &self.fail_writes
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn modify(&self, id: ProblemId, f: impl FnOnce(&mut Problem)) -> anyhow::Result<Option<Problem>> {
        self.fail_writes.check()?;
        Ok(self.docs.get_mut(&id).map(|mut doc| {
            f(&mut doc);
            doc.clone()
        }))
    }
}

#[async_trait]
impl ProblemRepository for MemoryProblemRepo {
    async fn insert(&self, problem: Problem) -> anyhow::Result<Problem> {
        self.fail_writes.check()?;
        if self.docs.contains_key(&problem.id) {
            bail!("problem {} already exists", problem.id);
        }
        self.docs.insert(problem.id, problem.clone());
        trace!(problem_id = %problem.id, "problem stored");
        Ok(problem)
    }

    async fn find_by_id(&self, id: ProblemId) -> anyhow::Result<Option<Problem>> {
        Ok(self.docs.get(&id).map(|doc| doc.clone()))
    }

    async fn find(&self, filter: ProblemFilter) -> anyhow::Result<Vec<Problem>> {
        let mut found: Vec<Problem> = self
            .docs
            .iter()
            .filter(|doc| filter.matches(doc.value()))
            .map(|doc| doc.clone())
            .collect();
        found.sort_by_key(|p| (p.created_at, p.id));
        Ok(found)
    }

    async fn update(
        &self,
        id: ProblemId,
        patch: ProblemPatch,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Problem>> {
        self.modify(id, |doc| doc.apply_patch(&patch, updated_at))
    }

    async fn replace(&self, problem: Problem) -> anyhow::Result<Problem> {
        self.fail_writes.check()?;
        self.docs.insert(problem.id, problem.clone());
        Ok(problem)
    }

    async fn delete(&self, id: ProblemId) -> anyhow::Result<Option<Problem>> {
        self.fail_writes.check()?;
        Ok(self.docs.remove(&id).map(|(_, doc)| doc))
    }

    async fn increment(
        &self,
        id: ProblemId,
        counter: ProblemCounter,
        delta: i64,
    ) -> anyhow::Result<Option<Problem>> {
        self.modify(id, |doc| doc.apply_delta(counter, delta))
    }

    async fn attach_solution(
        &self,
        id: ProblemId,
        solution: SolutionId,
    ) -> anyhow::Result<Option<Problem>> {
        self.modify(id, |doc| {
            if !doc.solutions.contains(&solution) {
                doc.solutions.push(solution);
                doc.apply_delta(ProblemCounter::SolutionCount, 1);
            }
        })
    }

    async fn detach_solution(
        &self,
        id: ProblemId,
        solution: SolutionId,
    ) -> anyhow::Result<Option<Problem>> {
        self.modify(id, |doc| {
            let before = doc.solutions.len();
            doc.solutions.retain(|s| *s != solution);
            if doc.solutions.len() < before {
                doc.apply_delta(ProblemCounter::SolutionCount, -1);
            }
        })
    }
}

// ── Solutions ───────────────────────────────────────────────────────────────

pub struct MemorySolutionRepo {
    docs: DashMap<SolutionId, Solution>,
    fail_writes: FailSwitch,
}

impl Default for MemorySolutionRepo {
    fn default() -> Self {
        Self {
            docs: DashMap::new(),
            fail_writes: FailSwitch::new("solution"),
        }
    }
}

impl MemorySolutionRepo {
    pub fn fail_writes(&self) -> &FailSwitch {
        &self.fail_writes
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[async_trait]
impl SolutionRepository for MemorySolutionRepo {
    async fn insert(&self, solution: Solution) -> anyhow::Result<Solution> {
        self.fail_writes.check()?;
        if self.docs.contains_key(&solution.id) {
            bail!("solution {} already exists", solution.id);
        }
        self.docs.insert(solution.id, solution.clone());
        Ok(solution)
    }

    async fn find_by_id(&self, id: SolutionId) -> anyhow::Result<Option<Solution>> {
        Ok(self.docs.get(&id).map(|doc| doc.clone()))
    }

    async fn find_by_problem(&self, problem_id: ProblemId) -> anyhow::Result<Vec<Solution>> {
        let mut found: Vec<Solution> = self
            .docs
            .iter()
            .filter(|doc| doc.problem_id == problem_id)
            .map(|doc| doc.clone())
            .collect();
        found.sort_by_key(|s| (s.created_at, s.id));
        Ok(found)
    }

    async fn update(
        &self,
        id: SolutionId,
        patch: SolutionPatch,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Solution>> {
        self.fail_writes.check()?;
        Ok(self.docs.get_mut(&id).map(|mut doc| {
            doc.apply_patch(&patch, updated_at);
            doc.clone()
        }))
    }

    async fn replace(&self, solution: Solution) -> anyhow::Result<Solution> {
        self.fail_writes.check()?;
        self.docs.insert(solution.id, solution.clone());
        Ok(solution)
    }

    async fn delete(&self, id: SolutionId) -> anyhow::Result<Option<Solution>> {
        self.fail_writes.check()?;
        Ok(self.docs.remove(&id).map(|(_, doc)| doc))
    }

    async fn delete_by_problem(&self, problem_id: ProblemId) -> anyhow::Result<u64> {
        self.fail_writes.check()?;
        let before = self.docs.len();
        self.docs.retain(|_, doc| doc.problem_id != problem_id);
        Ok(before.saturating_sub(self.docs.len()) as u64)
    }

    async fn increment(
        &self,
        id: SolutionId,
        counter: SolutionCounter,
        delta: i64,
    ) -> anyhow::Result<Option<Solution>> {
        self.fail_writes.check()?;
        Ok(self.docs.get_mut(&id).map(|mut doc| {
            doc.apply_delta(counter, delta);
            doc.clone()
        }))
    }
}

// ── Logs ────────────────────────────────────────────────────────────────────

pub struct MemoryLogRepo {
    records: RwLock<Vec<LogRecord>>,
    fail_writes: FailSwitch,
}

impl Default for MemoryLogRepo {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            fail_writes: FailSwitch::new("log"),
        }
    }
}

impl MemoryLogRepo {
    pub fn fail_writes(&self) -> &FailSwitch {
        &self.fail_writes
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl LogRepository for MemoryLogRepo {
    async fn insert(
        &self,
        entry: LogEntry,
        id: LogId,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<LogRecord> {
        self.fail_writes.check()?;
        let record = LogRecord::from_entry(id, entry, created_at);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn find(&self, filter: LogFilter) -> anyhow::Result<Vec<LogRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn clear(&self) -> anyhow::Result<u64> {
        self.fail_writes.check()?;
        let mut records = self.records.write().await;
        let removed = records.len() as u64;
        records.clear();
        Ok(removed)
    }
}

/// The three in-memory collections, shared by handle.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub problems: Arc<MemoryProblemRepo>,
    pub solutions: Arc<MemorySolutionRepo>,
    pub logs: Arc<MemoryLogRepo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}
