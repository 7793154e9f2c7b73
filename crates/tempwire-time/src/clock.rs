//! Clock implementations for Tempwire

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempwire_core::{duration_micros, Timestamp};

/// Source of monotonic timestamps
/// INVARIANT: successive calls to `now` never go backwards
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Monotonic clock backed by the OS, zero at construction
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    reference: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            reference: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(duration_micros(self.reference.elapsed()))
    }
}

/// Manually advanced clock
///
/// Clones share the same time, so a test can keep a handle while the
/// engine owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock starting at `start`
    pub fn starting_at(start: Timestamp) -> Self {
        ManualClock {
            micros: Arc::new(AtomicU64::new(start.as_micros())),
        }
    }

    /// Move time forward, returning the new time
    pub fn advance(&self, dt: Duration) -> Timestamp {
        let delta = duration_micros(dt);
        let previous = self
            .micros
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| {
                Some(t.saturating_add(delta))
            })
            .unwrap_or_else(|t| t);
        Timestamp::from_micros(previous.saturating_add(delta))
    }

    /// Jump to `target`; moving backwards is ignored
    pub fn set(&self, target: Timestamp) {
        self.micros.fetch_max(target.as_micros(), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.micros.load(Ordering::Acquire))
    }
}
