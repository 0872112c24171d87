//! # RateLimiter
//!
//! In-memory, fixed-window limiter keyed by `(actor, action)`. The first
//! action inside a window is allowed and stamps the window start; every
//! further attempt before the window elapses is denied without moving it.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{ActorId, Clock};
use std::sync::Arc;
use std::time::Duration;

pub struct RateLimiter {
    window: Duration,
    clock: Arc<dyn Clock>,
    last_action: DashMap<(ActorId, String), DateTime<Utc>>,
}

impl RateLimiter {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            last_action: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` when the actor must wait before doing `action` again.
    ///
    /// The check and the stamp happen under the same shard lock, so two
    /// concurrent first attempts cannot both pass.
    pub fn is_rate_limited(&self, actor: ActorId, action: &str) -> bool {
        let now = self.clock.now();
        match self.last_action.entry((actor, action.to_owned())) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                false
            }
            Entry::Occupied(mut slot) => {
                if self.elapsed_since(*slot.get(), now) < self.window {
                    true
                } else {
                    slot.insert(now);
                    false
                }
            }
        }
    }

    /// Drops entries whose window has already elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.last_action.len();
        self.last_action
            .retain(|_, stamped| self.elapsed_since(*stamped, now) < self.window);
        before.saturating_sub(self.last_action.len())
    }

    pub fn tracked(&self) -> usize {
        self.last_action.len()
    }

    // A clock that moved backwards counts as no time elapsed.
    fn elapsed_since(&self, then: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        (now - then).to_std().unwrap_or_default()
    }
}
