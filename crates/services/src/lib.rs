//! rusty-forum/crates/services/src/lib.rs
//!
//! Business logic for the forum. Services depend only on the ports in
//! `domains`; adapters are injected at wiring time.

pub mod audit;
pub mod context;
pub mod mediator;
pub mod policy;
pub mod problem;
pub mod rate_limit;
pub mod saga;
pub mod solution;
pub mod wiring;

pub use audit::AuditLog;
pub use context::{StaticActor, SystemClock};
pub use mediator::{Deferred, ProblemLink, SolutionLink};
pub use problem::{ProblemSearch, ProblemService, CREATE_PROBLEM_ACTION};
pub use rate_limit::RateLimiter;
pub use saga::{RollbackFailure, Saga};
pub use solution::SolutionService;
pub use wiring::{ForumServices, Repositories};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use domains::Clock;
    use std::sync::Mutex;

    /// Clock that only moves when told to.
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl Default for ManualClock {
        fn default() -> Self {
            let start = Utc
                .with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
                .single()
                .unwrap_or_else(Utc::now);
            Self {
                now: Mutex::new(start),
            }
        }
    }

    impl ManualClock {
        pub fn advance_secs(&self, secs: i64) {
            *self.now.lock().unwrap() += Duration::seconds(secs);
        }

        pub fn rewind_secs(&self, secs: i64) {
            *self.now.lock().unwrap() -= Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}
