//! Shared harness for the end-to-end tests: a fully wired forum on the
//! in-memory backend with a switchable actor and generated fixtures.

use domains::{ActorContext, ActorId, NewProblem, NewSolution, ProblemStatus};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::Fake;
use services::{ForumServices, Repositories, SystemClock};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage_adapters::MemoryStore;
use uuid::Uuid;

/// Actor context the test can re-point at another identity.
pub struct SwitchableActor {
    current: Mutex<ActorId>,
}

impl SwitchableActor {
    pub fn new(actor: ActorId) -> Self {
        Self {
            current: Mutex::new(actor),
        }
    }

    pub fn set(&self, actor: ActorId) {
        *self.current.lock().unwrap() = actor;
    }
}

impl ActorContext for SwitchableActor {
    fn current_actor(&self) -> ActorId {
        *self.current.lock().unwrap()
    }
}

pub struct Forum {
    pub services: ForumServices,
    pub store: MemoryStore,
    pub actor: Arc<SwitchableActor>,
    pub owner: ActorId,
}

impl Forum {
    /// A forum whose rate limiter never triggers.
    pub fn new() -> Self {
        Self::with_window(Duration::ZERO)
    }

    pub fn with_window(window: Duration) -> Self {
        let store = MemoryStore::new();
        let owner = ActorId::new();
        let actor = Arc::new(SwitchableActor::new(owner));
        let repos = Repositories {
            problems: store.problems.clone(),
            solutions: store.solutions.clone(),
            logs: store.logs.clone(),
        };
        let services = ForumServices::wire(repos, actor.clone(), Arc::new(SystemClock), window)
            .expect("wire forum services");
        Self {
            services,
            store,
            actor,
            owner,
        }
    }

    /// Acts as somebody other than the owner until `act_as_owner`.
    pub fn act_as_stranger(&self) -> ActorId {
        let stranger = ActorId::new();
        self.actor.set(stranger);
        stranger
    }

    pub fn act_as_owner(&self) {
        self.actor.set(self.owner);
    }
}

impl Default for Forum {
    fn default() -> Self {
        Self::new()
    }
}

/// A valid problem with a generated, unique title.
pub fn fake_problem() -> NewProblem {
    let sentence: String = Sentence(3..6).fake();
    NewProblem {
        title: format!("{} {}", sentence.trim_end_matches('.'), &Uuid::new_v4().simple().to_string()[..8]),
        details: Paragraph(1..3).fake(),
        try_and_expect: Some(Sentence(4..8).fake()),
        tags: Some("rust,async".into()),
        status: Some(ProblemStatus::Active),
    }
}

pub fn problem_titled(title: &str) -> NewProblem {
    NewProblem {
        title: title.to_owned(),
        ..fake_problem()
    }
}

pub fn fake_solution() -> NewSolution {
    NewSolution {
        details: Paragraph(1..2).fake(),
    }
}
