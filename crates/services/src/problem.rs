//! # ProblemService
//!
//! Write pipeline for problems. Every mutation follows the same shape:
//!
//! 1. deny-before-attempt checks (validation, rate limit, duplicates, ownership),
//! 2. the primary write,
//! 3. an audit record whose failure rolls the primary write back,
//! 4. on any failure after step 1, a best-effort failure record and a typed error.

use async_trait::async_trait;
use domains::{
    ActorContext, ActorId, Clock, ForumError, LogAction, LogEntry, NewProblem, Problem,
    ProblemCounter, ProblemDetails, ProblemFilter, ProblemId, ProblemPatch, ProblemRepository,
    ProblemStatus, Result, SolutionId, TargetModel, TitleMatch,
};
use std::sync::{Arc, Weak};
use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::mediator::{Deferred, ProblemLink, SolutionLink};
use crate::policy::{ensure_owner, validate_new_problem, validate_problem_patch};
use crate::rate_limit::RateLimiter;
use crate::saga::Saga;

/// Rate limiter key for problem creation.
pub const CREATE_PROBLEM_ACTION: &str = "create_problem";

const MODEL: TargetModel = TargetModel::Problem;

/// Query accepted by the public search operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemSearch {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    pub status: Option<ProblemStatus>,
}

impl ProblemSearch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none()
    }
}

pub struct ProblemService {
    problems: Arc<dyn ProblemRepository>,
    audit: Arc<AuditLog>,
    limiter: Arc<RateLimiter>,
    actor: Arc<dyn ActorContext>,
    clock: Arc<dyn Clock>,
    solutions: Deferred<dyn SolutionLink>,
}

impl ProblemService {
    pub fn new(
        problems: Arc<dyn ProblemRepository>,
        audit: Arc<AuditLog>,
        limiter: Arc<RateLimiter>,
        actor: Arc<dyn ActorContext>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            problems,
            audit,
            limiter,
            actor,
            clock,
            solutions: Deferred::new("solution service"),
        }
    }

    /// Completes construction once the solution service exists.
    pub fn bind_solutions(&self, solutions: Weak<dyn SolutionLink>) -> Result<()> {
        self.solutions.bind(solutions)
    }

    #[tracing::instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: NewProblem) -> Result<Problem> {
        validate_new_problem(&input)?;
        let actor = self.actor.current_actor();

        if self.limiter.is_rate_limited(actor, CREATE_PROBLEM_ACTION) {
            return Err(ForumError::RateLimited(
                "You are creating problems too quickly. Please wait and try again.".into(),
            ));
        }
        self.ensure_unique_title(&input.title, None).await?;

        let problem = Problem::from_new(ProblemId::new(), input, actor, self.clock.now());
        let created = match self.problems.insert(problem).await {
            Ok(created) => created,
            Err(e) => {
                let err = ForumError::database("Failed to create the problem", &e);
                return self.audit.reject(actor, LogAction::Create, MODEL, err).await;
            }
        };

        let id = created.id;
        let problems = &self.problems;
        let mut saga = Saga::new("create problem");
        saga.compensate_with("delete created problem", async move {
            problems.delete(id).await.map(drop)
        });
        let entry = LogEntry::success(actor, LogAction::Create, MODEL, id);
        if let Err(err) = self.audit.record_or_compensate(entry, saga).await {
            return self.audit.reject(actor, LogAction::Create, MODEL, err).await;
        }

        info!(problem_id = %id, "problem created");
        Ok(created)
    }

    pub async fn get(&self, id: ProblemId) -> Result<Problem> {
        self.problems
            .find_by_id(id)
            .await
            .map_err(|e| ForumError::database(format!("Failed to fetch problem {id}"), &e))?
            .ok_or_else(|| ForumError::not_found("Problem", id))
    }

    pub async fn list(&self) -> Result<Vec<Problem>> {
        self.problems
            .find(ProblemFilter::default())
            .await
            .map_err(|e| ForumError::database("Failed to list problems", &e))
    }

    pub async fn search(&self, query: ProblemSearch) -> Result<Vec<Problem>> {
        let filter = ProblemFilter {
            title: query.title.map(TitleMatch::Contains),
            status: query.status,
            created_by: None,
        };
        self.problems
            .find(filter)
            .await
            .map_err(|e| ForumError::database("Failed to search problems", &e))
    }

    /// Reads a problem with its solutions and counts the view.
    #[tracing::instrument(skip(self))]
    pub async fn view(&self, id: ProblemId) -> Result<ProblemDetails> {
        let problem = match self.problems.increment(id, ProblemCounter::Views, 1).await {
            Ok(Some(problem)) => problem,
            Ok(None) => return Err(ForumError::not_found("Problem", id)),
            Err(e) => {
                let err = ForumError::database(format!("Failed to count a view of problem {id}"), &e);
                let actor = self.actor.current_actor();
                return self.audit.reject(actor, LogAction::Update, MODEL, err).await;
            }
        };
        let solutions = self.solutions.get()?.solutions_for(id).await?;
        Ok(ProblemDetails { problem, solutions })
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: ProblemId, patch: ProblemPatch) -> Result<Problem> {
        validate_problem_patch(&patch)?;
        let actor = self.actor.current_actor();
        let original = self.get(id).await?;
        ensure_owner(actor, original.created_by, "problem")?;
        if patch.is_empty() {
            return Ok(original);
        }
        if let Some(title) = &patch.title {
            if !TitleMatch::Exact(original.title.clone()).matches(title) {
                self.ensure_unique_title(title, Some(id)).await?;
            }
        }

        let updated = match self.problems.update(id, patch, self.clock.now()).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                let err = ForumError::not_found("Problem", id);
                return self.audit.reject(actor, LogAction::Update, MODEL, err).await;
            }
            Err(e) => {
                let err = ForumError::database("Failed to update the problem", &e);
                return self.audit.reject(actor, LogAction::Update, MODEL, err).await;
            }
        };

        let problems = &self.problems;
        let mut saga = Saga::new("update problem");
        saga.compensate_with("restore previous version", async move {
            problems.replace(original).await.map(drop)
        });
        let entry = LogEntry::success(actor, LogAction::Update, MODEL, id);
        if let Err(err) = self.audit.record_or_compensate(entry, saga).await {
            return self.audit.reject(actor, LogAction::Update, MODEL, err).await;
        }

        info!(problem_id = %id, "problem updated");
        Ok(updated)
    }

    /// Deletes the problem, then its solutions.
    ///
    /// The solution cascade runs after the audited delete is final and is not
    /// part of its rollback; a failed cascade is traced and recorded.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProblemId) -> Result<Problem> {
        let actor = self.actor.current_actor();
        let original = self.get(id).await?;
        ensure_owner(actor, original.created_by, "problem")?;

        let deleted = match self.problems.delete(id).await {
            Ok(Some(deleted)) => deleted,
            Ok(None) => {
                let err = ForumError::not_found("Problem", id);
                return self.audit.reject(actor, LogAction::Delete, MODEL, err).await;
            }
            Err(e) => {
                let err = ForumError::database("Failed to delete the problem", &e);
                return self.audit.reject(actor, LogAction::Delete, MODEL, err).await;
            }
        };

        let problems = &self.problems;
        let snapshot = deleted.clone();
        let mut saga = Saga::new("delete problem");
        saga.compensate_with("re-insert deleted problem", async move {
            problems.replace(snapshot).await.map(drop)
        });
        let entry = LogEntry::success(actor, LogAction::Delete, MODEL, id);
        if let Err(err) = self.audit.record_or_compensate(entry, saga).await {
            return self.audit.reject(actor, LogAction::Delete, MODEL, err).await;
        }
        info!(problem_id = %id, "problem deleted");

        self.cascade_delete_solutions(actor, id).await;
        Ok(deleted)
    }

    /// Counts one up or down vote.
    #[tracing::instrument(skip(self))]
    pub async fn vote(&self, id: ProblemId, is_up_vote: bool) -> Result<Problem> {
        let actor = self.actor.current_actor();
        let counter = ProblemCounter::vote(is_up_vote);

        let voted = match self.problems.increment(id, counter, 1).await {
            Ok(Some(voted)) => voted,
            Ok(None) => return Err(ForumError::not_found("Problem", id)),
            Err(e) => {
                let err = ForumError::database("Failed to vote the problem", &e);
                return self.audit.reject(actor, LogAction::Vote, MODEL, err).await;
            }
        };

        let problems = &self.problems;
        let mut saga = Saga::new("vote problem");
        saga.compensate_with("withdraw vote", async move {
            problems.increment(id, counter, -1).await.map(drop)
        });
        let entry = LogEntry::success(actor, LogAction::Vote, MODEL, id);
        if let Err(err) = self.audit.record_or_compensate(entry, saga).await {
            return self.audit.reject(actor, LogAction::Vote, MODEL, err).await;
        }
        Ok(voted)
    }

    async fn ensure_unique_title(&self, title: &str, except: Option<ProblemId>) -> Result<()> {
        let existing = self
            .problems
            .find(ProblemFilter::exact_title(title))
            .await
            .map_err(|e| ForumError::database("Failed to check for duplicate titles", &e))?;
        if existing.iter().any(|p| Some(p.id) != except) {
            return Err(ForumError::DuplicateTitle(
                "A problem with a similar title already exists.".into(),
            ));
        }
        Ok(())
    }

    async fn cascade_delete_solutions(&self, actor: ActorId, id: ProblemId) {
        let outcome = match self.solutions.get() {
            Ok(link) => link.delete_for_problem(id).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(removed) => info!(problem_id = %id, removed, "solutions of deleted problem removed"),
            Err(err) => {
                warn!(problem_id = %id, error = %err, "solution cascade failed");
                self.audit
                    .record_failure(
                        actor,
                        LogAction::Delete,
                        TargetModel::Solution,
                        format!("Failed to delete the solutions of problem {id}: {err}"),
                    )
                    .await;
            }
        }
    }
}

#[async_trait]
impl ProblemLink for ProblemService {
    async fn ensure_exists(&self, id: ProblemId) -> Result<Problem> {
        self.get(id).await
    }

    async fn attach_solution(&self, id: ProblemId, solution: SolutionId) -> Result<Problem> {
        self.problems
            .attach_solution(id, solution)
            .await
            .map_err(|e| ForumError::database(format!("Failed to add solution {solution} to problem {id}"), &e))?
            .ok_or_else(|| ForumError::not_found("Problem", id))
    }

    async fn detach_solution(&self, id: ProblemId, solution: SolutionId) -> Result<Problem> {
        self.problems
            .detach_solution(id, solution)
            .await
            .map_err(|e| {
                ForumError::database(format!("Failed to remove solution {solution} from problem {id}"), &e)
            })?
            .ok_or_else(|| ForumError::not_found("Problem", id))
    }
}
