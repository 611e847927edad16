// Time Provider Port (for testability)

use std::sync::atomic::{AtomicI64, Ordering};

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Current time in milliseconds since epoch, never lower than a
    /// previously returned value
    fn now_millis(&self) -> i64;
}

/// System time provider (production)
///
/// Clamped so that wall-clock adjustments never produce a timestamp lower
/// than one already handed out by this provider.
#[derive(Default)]
pub struct SystemTimeProvider {
    last: AtomicI64,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self.last.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}

/// Deterministic clock for tests: starts at `start`, advances by `step` per call
pub struct FixedTimeProvider {
    next: AtomicI64,
    step: i64,
}

impl FixedTimeProvider {
    pub fn new(start: i64, step: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
            step,
        }
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.next.fetch_add(self.step, Ordering::SeqCst)
    }
}
