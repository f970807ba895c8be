//! Fixed-period task runner with per-task overlap prevention.
//!
//! Every task owns an `Idle`/`Running` state. A tick that finds its task
//! `Running` is dropped, never queued. A tick that finds it `Idle` flips it to
//! `Running` and spawns the body; the state goes back to `Idle` when the run
//! ends, whether the body succeeded, failed or panicked. Errors are logged
//! and counted here and never reach the caller, so the next tick always runs.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::metrics::{TaskMetrics, TaskMetricsSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
}

/// Read-only handle on one task's state and counters.
#[derive(Clone)]
pub struct TaskMonitor {
    name: &'static str,
    running: Arc<AtomicBool>,
    metrics: TaskMetrics,
}

impl TaskMonitor {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            running: Arc::new(AtomicBool::new(false)),
            metrics: TaskMetrics::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> TaskState {
        if self.running.load(Ordering::Acquire) {
            TaskState::Running
        } else {
            TaskState::Idle
        }
    }

    pub fn metrics(&self) -> &TaskMetrics {
        &self.metrics
    }

    /// Logs the current state and counters and returns them.
    pub fn report(&self) -> TaskMetricsSnapshot {
        let counts = self.metrics.snapshot();
        info!(
            task = self.name,
            state = ?self.state(),
            started = counts.started,
            succeeded = counts.succeeded,
            failed = counts.failed,
            skipped = counts.skipped,
            last_duration_ms = counts.last_duration_ms,
            "task summary"
        );
        counts
    }

    fn try_begin(&self) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                running: Arc::clone(&self.running),
            })
    }
}

impl fmt::Debug for TaskMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskMonitor")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

/// Returns the task to `Idle` when dropped.
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// A named body run every `period`.
pub struct PeriodicTask<F> {
    monitor: TaskMonitor,
    period: Duration,
    body: Arc<F>,
}

impl<F, Fut, E> PeriodicTask<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    pub fn new(name: &'static str, period: Duration, body: F) -> Self {
        Self {
            monitor: TaskMonitor::new(name),
            period,
            body: Arc::new(body),
        }
    }

    pub fn monitor(&self) -> TaskMonitor {
        self.monitor.clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Handles a single tick.
    ///
    /// Returns the spawned run, or `None` if the previous run is still in
    /// flight and this tick was dropped.
    pub fn tick(&self) -> Option<JoinHandle<()>> {
        let monitor = &self.monitor;
        let Some(guard) = monitor.try_begin() else {
            monitor.metrics.record_skip();
            debug!(task = monitor.name, "previous run still in flight, skipping tick");
            return None;
        };
        monitor.metrics.record_start();

        // Build the future on the run task so a panic while constructing it
        // is contained like one raised while polling it.
        let body = Arc::clone(&self.body);
        let run = tokio::spawn(async move { (*body)().await });
        let monitor = monitor.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            let started = Instant::now();
            match run.await {
                Ok(Ok(())) => {
                    monitor.metrics.record_success(started.elapsed());
                    let counts = monitor.metrics.snapshot();
                    debug!(
                        task = monitor.name,
                        elapsed = ?started.elapsed(),
                        succeeded = counts.succeeded,
                        failed = counts.failed,
                        skipped = counts.skipped,
                        "task run finished"
                    );
                }
                Ok(Err(err)) => {
                    monitor.metrics.record_failure(started.elapsed());
                    let counts = monitor.metrics.snapshot();
                    error!(
                        task = monitor.name,
                        error = %err,
                        succeeded = counts.succeeded,
                        failed = counts.failed,
                        skipped = counts.skipped,
                        "task run failed"
                    );
                }
                Err(err) => {
                    monitor.metrics.record_failure(started.elapsed());
                    let counts = monitor.metrics.snapshot();
                    error!(
                        task = monitor.name,
                        error = %err,
                        succeeded = counts.succeeded,
                        failed = counts.failed,
                        skipped = counts.skipped,
                        "task run aborted"
                    );
                }
            }
        }))
    }

    /// Ticks forever. The first tick fires immediately.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let _ = self.tick();
        }
    }
}

/// Drives any number of independent periodic tasks.
#[derive(Default)]
pub struct Scheduler {
    tasks: JoinSet<()>,
    monitors: Vec<TaskMonitor>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts ticking `task` right away and returns its monitor.
    pub fn spawn<F, Fut, E>(&mut self, task: PeriodicTask<F>) -> TaskMonitor
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let monitor = task.monitor();
        info!(task = monitor.name, period = ?task.period(), "scheduling task");
        self.tasks.spawn(task.run());
        self.monitors.push(monitor.clone());
        monitor
    }

    pub fn monitors(&self) -> &[TaskMonitor] {
        &self.monitors
    }

    pub fn monitor(&self, name: &str) -> Option<&TaskMonitor> {
        self.monitors.iter().find(|monitor| monitor.name == name)
    }

    pub fn state(&self, name: &str) -> Option<TaskState> {
        self.monitor(name).map(TaskMonitor::state)
    }

    /// Runs until every ticker has stopped, which only happens if the runtime
    /// is shutting down.
    pub async fn run(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(err) = result {
                error!(error = %err, "task ticker stopped");
            }
        }
    }
}
