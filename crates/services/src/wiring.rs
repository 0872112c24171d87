//! Assembles the service graph from a set of repositories.

use domains::{ActorContext, Clock, LogRepository, ProblemRepository, Result, SolutionRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::audit::AuditLog;
use crate::mediator::{ProblemLink, SolutionLink};
use crate::problem::ProblemService;
use crate::rate_limit::RateLimiter;
use crate::solution::SolutionService;

/// The three stores a backend has to provide.
#[derive(Clone)]
pub struct Repositories {
    pub problems: Arc<dyn ProblemRepository>,
    pub solutions: Arc<dyn SolutionRepository>,
    pub logs: Arc<dyn LogRepository>,
}

#[derive(Clone)]
pub struct ForumServices {
    pub problems: Arc<ProblemService>,
    pub solutions: Arc<SolutionService>,
    pub audit: Arc<AuditLog>,
    pub limiter: Arc<RateLimiter>,
}

impl ForumServices {
    /// Builds every service and closes the problem/solution cycle.
    ///
    /// The solution service holds the problem service strongly; the problem
    /// service only keeps a weak handle back.
    pub fn wire(
        repos: Repositories,
        actor: Arc<dyn ActorContext>,
        clock: Arc<dyn Clock>,
        rate_limit_window: Duration,
    ) -> Result<Self> {
        let audit = Arc::new(AuditLog::new(repos.logs, clock.clone(), actor.clone()));
        let limiter = Arc::new(RateLimiter::new(rate_limit_window, clock.clone()));

        let problems = Arc::new(ProblemService::new(
            repos.problems,
            audit.clone(),
            limiter.clone(),
            actor.clone(),
            clock.clone(),
        ));
        let solutions = Arc::new(SolutionService::new(
            repos.solutions,
            problems.clone() as Arc<dyn ProblemLink>,
            audit.clone(),
            actor,
            clock,
        ));

        let link: Arc<dyn SolutionLink> = solutions.clone();
        problems.bind_solutions(Arc::downgrade(&link))?;
        debug!("forum services wired");

        Ok(Self {
            problems,
            solutions,
            audit,
            limiter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticActor;
    use crate::test_support::ManualClock;
    use domains::{
        ActorId, MockLogRepository, MockProblemRepository, MockSolutionRepository, ProblemId,
    };
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_wired_problem_service_reaches_solutions() {
        let mut solutions = MockSolutionRepository::new();
        solutions
            .expect_find_by_problem()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let repos = Repositories {
            problems: Arc::new(MockProblemRepository::new()),
            solutions: Arc::new(solutions),
            logs: Arc::new(MockLogRepository::new()),
        };
        let services = assert_ok!(ForumServices::wire(
            repos,
            Arc::new(StaticActor::new(ActorId::new())),
            Arc::new(ManualClock::default()),
            Duration::from_secs(60),
        ));

        let link: Arc<dyn SolutionLink> = services.solutions.clone();
        let found = assert_ok!(link.solutions_for(ProblemId::new()).await);
        assert!(found.is_empty());
        assert_eq!(services.limiter.window(), Duration::from_secs(60));
    }
}
