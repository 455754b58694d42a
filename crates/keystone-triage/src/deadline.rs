//! Per-metric time budgets.
//!
//! Every metric runs against its own [`Deadline`]. Algorithms poll
//! [`Deadline::is_expired`] between atomic units of work (one power
//! iteration, one betweenness pivot, one DFS step batch) and never inside
//! one, so whatever they have merged when the budget runs out is still
//! consistent.
//!
//! Besides wall-clock budgets, [`Deadline::after_checks`] counts polls
//! instead of time. Cut-off points are then reproducible, which is how the
//! partial-run paths are tested.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
enum Budget {
    Unbounded,
    Wall(Duration),
    /// Polls left before expiry.
    Checks(AtomicUsize),
}

#[derive(Debug)]
pub struct Deadline {
    started: Instant,
    budget: Budget,
}

impl Deadline {
    /// A deadline `budget` from now. A zero budget is already expired.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget: Budget::Wall(budget),
        }
    }

    /// A deadline that never expires.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            budget: Budget::Unbounded,
        }
    }

    /// A deadline that answers "not expired" to the first `checks` polls and
    /// "expired" to every poll after that, whatever the clock says.
    #[must_use]
    pub fn after_checks(checks: usize) -> Self {
        Self {
            started: Instant::now(),
            budget: Budget::Checks(AtomicUsize::new(checks)),
        }
    }

    /// The same budget, counted from now.
    ///
    /// Used to keep setup work (such as starting a worker pool) out of a
    /// metric's budget. A poll-counted deadline keeps its remaining polls.
    #[must_use]
    pub fn restarted(&self) -> Self {
        let budget = match &self.budget {
            Budget::Unbounded => Budget::Unbounded,
            Budget::Wall(budget) => Budget::Wall(*budget),
            Budget::Checks(left) => Budget::Checks(AtomicUsize::new(left.load(Ordering::Relaxed))),
        };
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Returns `true` once the budget has been used up.
    ///
    /// Each call counts as one poll for [`Deadline::after_checks`].
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match &self.budget {
            Budget::Unbounded => false,
            Budget::Wall(budget) => self.started.elapsed() >= *budget,
            Budget::Checks(left) => left
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                .is_err(),
        }
    }

    /// Time since the deadline was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The wall-clock budget, if there is one.
    #[must_use]
    pub const fn budget(&self) -> Option<Duration> {
        match self.budget {
            Budget::Wall(budget) => Some(budget),
            Budget::Unbounded | Budget::Checks(_) => None,
        }
    }
}
