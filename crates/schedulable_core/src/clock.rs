//! Injectable time source.
//!
//! # Responsibility
//! - Provide the single "now" used to evaluate visibility for one read or
//!   one state check.
//! - Allow tests to freeze and advance time deterministically.
//!
//! # Invariants
//! - Callers read `now()` once per evaluation and reuse the value for every
//!   predicate of that evaluation.
//! - Returned instants are UTC and truncated to whole seconds, matching the
//!   storage precision of `ScheduleAt`.

use crate::model::schedule_at::ScheduleAt;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Time source used by queries and lifecycle helpers.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> ScheduleAt;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> ScheduleAt {
        (**self).now()
    }
}

/// Wall clock backed by `chrono::Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> ScheduleAt {
        ScheduleAt::from_datetime(Utc::now())
    }
}

/// Clock frozen at one instant until moved explicitly.
///
/// Interior mutability lets tests share one `&FrozenClock` with a service
/// and still advance it between calls.
#[derive(Debug)]
pub struct FrozenClock {
    current: Mutex<ScheduleAt>,
}

impl FrozenClock {
    pub fn new(at: ScheduleAt) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    /// Freezes at the current wall-clock second.
    pub fn at_system_now() -> Self {
        Self::new(SystemClock.now())
    }

    /// Moves the clock to `at`.
    pub fn set(&self, at: ScheduleAt) {
        *self.lock() = at;
    }

    /// Moves the clock forward (or backward for negative durations).
    pub fn advance(&self, by: Duration) {
        let mut current = self.lock();
        *current = current.shift(by);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScheduleAt> {
        // A poisoned guard still holds a valid instant.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> ScheduleAt {
        *self.lock()
    }
}

impl From<DateTime<Utc>> for FrozenClock {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(ScheduleAt::from_datetime(value))
    }
}
