//! # Saga
//!
//! Cross-collection writes are not transactional. Each forward step that
//! succeeds registers the step that undoes it; if a later step fails the
//! saga is rolled back, newest compensation first. Compensations are plain
//! futures, so nothing runs until `rollback` polls them, and each runs at
//! most once. A failed compensation is reported, never retried.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::{error, warn};

type Compensation<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// A compensation that itself failed.
#[derive(Debug, Error)]
#[error("{step}: {message}")]
pub struct RollbackFailure {
    pub step: &'static str,
    pub message: String,
}

pub struct Saga<'a> {
    name: &'static str,
    compensations: Vec<(&'static str, Compensation<'a>)>,
}

impl<'a> Saga<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            compensations: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.compensations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compensations.is_empty()
    }

    /// Registers the inverse of a forward step that has just succeeded.
    pub fn compensate_with<F>(&mut self, step: &'static str, undo: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'a,
    {
        self.compensations.push((step, Box::pin(undo)));
    }

    /// Every forward step succeeded; the compensations are discarded unpolled.
    pub fn commit(self) {}

    /// Runs every registered compensation in reverse order and collects the
    /// ones that failed. An empty result means the rollback was complete.
    pub async fn rollback(self) -> Vec<RollbackFailure> {
        let saga = self.name;
        let mut failures = Vec::new();
        for (step, undo) in self.compensations.into_iter().rev() {
            warn!(saga, step, "running compensation");
            if let Err(e) = undo.await {
                error!(saga, step, error = %format!("{e:#}"), "compensation failed");
                failures.push(RollbackFailure {
                    step,
                    message: format!("{e:#}"),
                });
            }
        }
        failures
    }
}

impl fmt::Debug for Saga<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<_> = self.compensations.iter().map(|(step, _)| *step).collect();
        f.debug_struct("Saga")
            .field("name", &self.name)
            .field("compensations", &steps)
            .finish()
    }
}

/// Joins rollback failures into one human readable line.
pub fn describe_failures(failures: &[RollbackFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
