//! # Cross-entity mediator
//!
//! Problem and solution services call into each other: a solution must
//! attach itself to its parent problem, and deleting or viewing a problem
//! must reach its solutions. Each side only sees the other through one of
//! the narrow traits below, and the problem side holds a [`Deferred`]
//! handle that is bound after both services exist.

use async_trait::async_trait;
use domains::{ForumError, Problem, ProblemId, Result, Solution, SolutionId};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Weak};

/// What the solution side needs from problems.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemLink: Send + Sync {
    /// Returns the problem or `NotFound`.
    async fn ensure_exists(&self, id: ProblemId) -> Result<Problem>;
    async fn attach_solution(&self, id: ProblemId, solution: SolutionId) -> Result<Problem>;
    async fn detach_solution(&self, id: ProblemId, solution: SolutionId) -> Result<Problem>;
}

/// What the problem side needs from solutions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SolutionLink: Send + Sync {
    async fn solutions_for(&self, problem: ProblemId) -> Result<Vec<Solution>>;
    /// Removes every solution of the problem; returns how many were removed.
    async fn delete_for_problem(&self, problem: ProblemId) -> Result<u64>;
}

/// A forward reference filled in once, after construction.
///
/// Holding a `Weak` keeps the two services from owning each other.
pub struct Deferred<T: ?Sized> {
    name: &'static str,
    target: OnceCell<Weak<T>>,
}

impl<T: ?Sized> Deferred<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            target: OnceCell::new(),
        }
    }

    pub fn bind(&self, target: Weak<T>) -> Result<()> {
        self.target
            .set(target)
            .map_err(|_| ForumError::Internal(format!("{} is already bound", self.name)))
    }

    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }

    pub fn get(&self) -> Result<Arc<T>> {
        self.target
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| ForumError::Internal(format!("{} is not available", self.name)))
    }
}
