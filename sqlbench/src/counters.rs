//! Counters shared between the virtual users and the watchdog.
use parking_lot::Mutex;
use sqlbench_core::QueryCounts;
use std::sync::Arc;

/// Completed and timed-out query counters.
///
/// Both counters live behind a single lock so a drain observes and resets them as one pair: an
/// increment lands entirely before or entirely after any given drain.
#[derive(Debug, Clone, Default)]
pub struct SharedCounters {
    inner: Arc<Mutex<QueryCounts>>,
}

impl SharedCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completed(&self) {
        self.inner.lock().completed += 1;
    }

    pub fn record_timeout(&self) {
        self.inner.lock().timed_out += 1;
    }

    /// Read both counters and reset them to zero.
    pub fn drain(&self) -> QueryCounts {
        std::mem::take(&mut *self.inner.lock())
    }

    #[cfg(test)]
    fn peek(&self) -> QueryCounts {
        *self.inner.lock()
    }
}
