//! Per-task run counters.
//!
//! Kept in memory only and exposed through [`crate::TaskMonitor`] so callers
//! (and tests) can observe how the scheduler treated each tick.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Counters for one scheduled task.
#[derive(Clone, Default)]
pub struct TaskMetrics {
    /// Ticks that started a run.
    started_total: Arc<Mutex<u64>>,
    /// Runs whose body returned `Ok`.
    succeeded_total: Arc<Mutex<u64>>,
    /// Runs whose body returned an error or panicked.
    failed_total: Arc<Mutex<u64>>,
    /// Ticks dropped because the previous run was still in flight.
    skipped_total: Arc<Mutex<u64>>,
    /// Duration of the most recently finished run in milliseconds.
    last_duration_ms: Arc<Mutex<u64>>,
}

/// Point-in-time copy of [`TaskMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskMetricsSnapshot {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub last_duration_ms: u64,
}

impl TaskMetricsSnapshot {
    /// Runs started but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.started
            .saturating_sub(self.succeeded)
            .saturating_sub(self.failed)
    }
}

impl TaskMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_start(&self) {
        *self.started_total.lock() += 1;
    }

    pub fn record_success(&self, duration: Duration) {
        *self.succeeded_total.lock() += 1;
        *self.last_duration_ms.lock() = duration_ms(duration);
    }

    pub fn record_failure(&self, duration: Duration) {
        *self.failed_total.lock() += 1;
        *self.last_duration_ms.lock() = duration_ms(duration);
    }

    pub fn record_skip(&self) {
        *self.skipped_total.lock() += 1;
    }

    pub fn snapshot(&self) -> TaskMetricsSnapshot {
        TaskMetricsSnapshot {
            started: *self.started_total.lock(),
            succeeded: *self.succeeded_total.lock(),
            failed: *self.failed_total.lock(),
            skipped: *self.skipped_total.lock(),
            last_duration_ms: *self.last_duration_ms.lock(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
