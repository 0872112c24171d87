//! Production implementations of the ambient ports: wall-clock time and the
//! stand-in actor identity used until real authentication is wired in.

use chrono::{DateTime, Utc};
use domains::{ActorContext, ActorId, Clock};

/// `Clock` backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Attributes every action to one configured actor.
#[derive(Debug, Clone, Copy)]
pub struct StaticActor {
    actor: ActorId,
}

impl StaticActor {
    pub fn new(actor: ActorId) -> Self {
        Self { actor }
    }
}

impl ActorContext for StaticActor {
    fn current_actor(&self) -> ActorId {
        self.actor
    }
}
