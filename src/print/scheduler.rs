//! Delayed task execution.
//!
//! Batch printing staggers its side effects in time. Those effects go through
//! a [`Scheduler`] so production code runs them on tokio timers while tests
//! drive a [`ManualScheduler`] clock by hand.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;

/// Work to run once its delay has elapsed.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    /// Run `task` after `delay`, measured from now.
    fn schedule(&self, delay: Duration, task: Task);
}

/// Scheduler backed by the tokio runtime.
///
/// Tasks run on the blocking pool since they typically spawn external
/// processes.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler on the runtime of the calling task. Panics outside a runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                log::error!("scheduled task failed: {}", e);
            }
        });
    }
}

struct Pending {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    pending: Vec<Pending>,
}

/// Virtual-clock scheduler.
///
/// Nothing runs until [`advance`](ManualScheduler::advance) moves the clock.
/// Tasks due at the same instant run in scheduling order, and a task may
/// schedule further tasks; those run within the same `advance` call if they
/// fall due before its end.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of tasks not yet run.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Delays (relative to the virtual epoch) of the tasks not yet run, soonest first.
    pub fn pending_due_times(&self) -> Vec<Duration> {
        let state = self.state.lock();
        let mut due: Vec<(Duration, u64)> = state.pending.iter().map(|p| (p.due, p.seq)).collect();
        due.sort();
        due.into_iter().map(|(d, _)| d).collect()
    }

    /// Move the clock forward by `by`, running every task that falls due.
    /// Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;

        while let Some(task) = self.take_due(target) {
            task();
            ran += 1;
        }

        let mut state = self.state.lock();
        if state.now < target {
            state.now = target;
        }
        ran
    }

    fn take_due(&self, target: Duration) -> Option<Task> {
        let mut state = self.state.lock();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        let next = state.pending.swap_remove(index);
        state.now = next.due;
        Some(next.task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut state = self.state.lock();
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.pending.push(Pending { due, seq, task });
    }
}
