//! # SolutionService
//!
//! Mirrors the problem pipeline and additionally keeps the parent problem's
//! solution list in step through [`ProblemLink`].

use async_trait::async_trait;
use domains::{
    ActorContext, Clock, ForumError, LogAction, LogEntry, NewSolution, ProblemId, Result, Solution,
    SolutionCounter, SolutionId, SolutionPatch, SolutionRepository, TargetModel,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::audit::AuditLog;
use crate::mediator::{ProblemLink, SolutionLink};
use crate::policy::{ensure_owner, require_text};
use crate::saga::Saga;

const MODEL: TargetModel = TargetModel::Solution;

pub struct SolutionService {
    solutions: Arc<dyn SolutionRepository>,
    problems: Arc<dyn ProblemLink>,
    audit: Arc<AuditLog>,
    actor: Arc<dyn ActorContext>,
    clock: Arc<dyn Clock>,
}

impl SolutionService {
    pub fn new(
        solutions: Arc<dyn SolutionRepository>,
        problems: Arc<dyn ProblemLink>,
        audit: Arc<AuditLog>,
        actor: Arc<dyn ActorContext>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            solutions,
            problems,
            audit,
            actor,
            clock,
        }
    }

    /// Posts a solution to an existing problem.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, problem_id: ProblemId, input: NewSolution) -> Result<Solution> {
        require_text("details", &input.details)?;
        let actor = self.actor.current_actor();
        let parent = self.problems.ensure_exists(problem_id).await?;

        let solution = Solution::from_new(SolutionId::new(), parent.id, input, actor, self.clock.now());
        let created = match self.solutions.insert(solution).await {
            Ok(created) => created,
            Err(e) => {
                let err = ForumError::database("Unable to create the solution", &e);
                return self.audit.reject(actor, LogAction::Create, MODEL, err).await;
            }
        };
        let id = created.id;

        if let Err(err) = self.problems.attach_solution(problem_id, id).await {
            let err = match self.solutions.delete(id).await {
                Ok(_) => err,
                Err(rollback) => {
                    error!(solution_id = %id, error = %format!("{rollback:#}"), "rollback of created solution failed");
                    ForumError::Database(format!(
                        "{err}. Rollback of solution {id} also failed: {rollback:#}"
                    ))
                }
            };
            return self.audit.reject(actor, LogAction::Create, MODEL, err).await;
        }

        let (solutions, problems) = (&self.solutions, &self.problems);
        let mut saga = Saga::new("create solution");
        saga.compensate_with("delete created solution", async move {
            solutions.delete(id).await.map(drop)
        });
        saga.compensate_with("detach solution from problem", async move {
            problems
                .detach_solution(problem_id, id)
                .await
                .map(drop)
                .map_err(anyhow::Error::from)
        });
        let entry = LogEntry::success(actor, LogAction::Create, MODEL, id);
        if let Err(err) = self.audit.record_or_compensate(entry, saga).await {
            return self.audit.reject(actor, LogAction::Create, MODEL, err).await;
        }

        info!(solution_id = %id, problem_id = %problem_id, "solution created");
        Ok(created)
    }

    pub async fn get(&self, id: SolutionId) -> Result<Solution> {
        self.solutions
            .find_by_id(id)
            .await
            .map_err(|e| ForumError::database(format!("Failed to retrieve solution {id}"), &e))?
            .ok_or_else(|| ForumError::not_found("Solution", id))
    }

    pub async fn list_for_problem(&self, problem_id: ProblemId) -> Result<Vec<Solution>> {
        self.solutions
            .find_by_problem(problem_id)
            .await
            .map_err(|e| {
                ForumError::database(format!("Failed to retrieve solutions for problem {problem_id}"), &e)
            })
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: SolutionId, patch: SolutionPatch) -> Result<Solution> {
        require_text("details", &patch.details)?;
        let actor = self.actor.current_actor();
        let original = self.get(id).await?;
        ensure_owner(actor, original.created_by, "solution")?;

        let updated = match self.solutions.update(id, patch, self.clock.now()).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                let err = ForumError::not_found("Solution", id);
                return self.audit.reject(actor, LogAction::Update, MODEL, err).await;
            }
            Err(e) => {
                let err = ForumError::database("Unable to update the solution", &e);
                return self.audit.reject(actor, LogAction::Update, MODEL, err).await;
            }
        };

        let solutions = &self.solutions;
        let mut saga = Saga::new("update solution");
        saga.compensate_with("restore previous version", async move {
            solutions.replace(original).await.map(drop)
        });
        let entry = LogEntry::success(actor, LogAction::Update, MODEL, id);
        if let Err(err) = self.audit.record_or_compensate(entry, saga).await {
            return self.audit.reject(actor, LogAction::Update, MODEL, err).await;
        }
        Ok(updated)
    }

    /// Removes the solution and its reference on the parent problem.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: SolutionId) -> Result<Solution> {
        let actor = self.actor.current_actor();
        let original = self.get(id).await?;
        ensure_owner(actor, original.created_by, "solution")?;

        let deleted = match self.solutions.delete(id).await {
            Ok(Some(deleted)) => deleted,
            Ok(None) => {
                let err = ForumError::not_found("Solution", id);
                return self.audit.reject(actor, LogAction::Delete, MODEL, err).await;
            }
            Err(e) => {
                let err = ForumError::database("Unable to delete the solution", &e);
                return self.audit.reject(actor, LogAction::Delete, MODEL, err).await;
            }
        };
        let problem_id = deleted.problem_id;

        let mut detached = true;
        match self.problems.detach_solution(problem_id, id).await {
            Ok(_) => {}
            // The parent is already gone; nothing references the solution.
            Err(ForumError::NotFound { .. }) => {
                warn!(solution_id = %id, problem_id = %problem_id, "parent problem missing while deleting solution");
                detached = false;
            }
            Err(err) => {
                let err = match self.solutions.replace(deleted.clone()).await {
                    Ok(_) => err,
                    Err(rollback) => ForumError::Database(format!(
                        "{err}. Restoring solution {id} also failed: {rollback:#}"
                    )),
                };
                return self.audit.reject(actor, LogAction::Delete, MODEL, err).await;
            }
        }

        let (solutions, problems) = (&self.solutions, &self.problems);
        let snapshot = deleted.clone();
        let mut saga = Saga::new("delete solution");
        saga.compensate_with("restore deleted solution", async move {
            solutions.replace(snapshot).await.map(drop)
        });
        if detached {
            saga.compensate_with("re-attach solution to problem", async move {
                problems
                    .attach_solution(problem_id, id)
                    .await
                    .map(drop)
                    .map_err(anyhow::Error::from)
            });
        }
        let entry = LogEntry::success(actor, LogAction::Delete, MODEL, id);
        if let Err(err) = self.audit.record_or_compensate(entry, saga).await {
            return self.audit.reject(actor, LogAction::Delete, MODEL, err).await;
        }

        info!(solution_id = %id, "solution deleted");
        Ok(deleted)
    }

    #[tracing::instrument(skip(self))]
    pub async fn vote(&self, id: SolutionId, is_up_vote: bool) -> Result<Solution> {
        let actor = self.actor.current_actor();
        let counter = SolutionCounter::vote(is_up_vote);

        let voted = match self.solutions.increment(id, counter, 1).await {
            Ok(Some(voted)) => voted,
            Ok(None) => return Err(ForumError::not_found("Solution", id)),
            Err(e) => {
                let err = ForumError::database("Unable to vote the solution", &e);
                return self.audit.reject(actor, LogAction::Vote, MODEL, err).await;
            }
        };

        let solutions = &self.solutions;
        let mut saga = Saga::new("vote solution");
        saga.compensate_with("withdraw vote", async move {
            solutions.increment(id, counter, -1).await.map(drop)
        });
        let entry = LogEntry::success(actor, LogAction::Vote, MODEL, id);
        if let Err(err) = self.audit.record_or_compensate(entry, saga).await {
            return self.audit.reject(actor, LogAction::Vote, MODEL, err).await;
        }
        Ok(voted)
    }
}

#[async_trait]
impl SolutionLink for SolutionService {
    async fn solutions_for(&self, problem: ProblemId) -> Result<Vec<Solution>> {
        self.list_for_problem(problem).await
    }

    async fn delete_for_problem(&self, problem: ProblemId) -> Result<u64> {
        self.solutions.delete_by_problem(problem).await.map_err(|e| {
            ForumError::database(
                format!("Failed to delete all solutions associated with problem {problem}"),
                &e,
            )
        })
    }
}
