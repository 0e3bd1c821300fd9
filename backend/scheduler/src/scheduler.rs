use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use watchdog_core::{is_cancellation, Task};

/// Lifecycle of a [`Scheduler`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

struct ScheduledTask {
    task: Arc<dyn Task>,
    interval: Duration,
}

/// Runs each registered task on its own fixed interval.
///
/// Every task gets an independent loop; a slow or failing task never delays
/// another. Runs of the same task never overlap: if a run outlasts its
/// interval, missed ticks are skipped rather than queued.
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
    root: CancellationToken,
    state: SchedulerState,
    handles: Vec<JoinHandle<()>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            root: CancellationToken::new(),
            state: SchedulerState::Idle,
            handles: Vec::new(),
        }
    }

    /// Registers `task` to run every `interval`. Only allowed before `start`.
    pub fn schedule_task(&mut self, task: Arc<dyn Task>, interval: Duration) -> Result<()> {
        if self.state != SchedulerState::Idle {
            bail!("cannot schedule task '{}': scheduler is {:?}", task.name(), self.state);
        }
        if interval.is_zero() {
            bail!("task '{}' has a zero interval", task.name());
        }
        info!(
            task = task.name(),
            interval_secs = interval.as_secs_f64(),
            "Registered task"
        );
        self.tasks.push(ScheduledTask { task, interval });
        Ok(())
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Spawns one loop per task and returns immediately.
    ///
    /// The first run of each task happens one full interval after `start`.
    /// A stopped scheduler cannot be started again.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SchedulerState::Idle => {}
            SchedulerState::Running => bail!("scheduler is already running"),
            SchedulerState::Stopped => bail!("scheduler has been stopped and cannot be restarted"),
        }

        info!(task_count = self.tasks.len(), "Scheduler started");
        for scheduled in &self.tasks {
            let task = Arc::clone(&scheduled.task);
            let stop = self.root.child_token();
            let interval = scheduled.interval;
            self.handles
                .push(tokio::spawn(run_task_loop(task, interval, stop)));
        }
        self.state = SchedulerState::Running;
        Ok(())
    }

    /// Signals every loop to stop and waits for in-flight runs to return.
    ///
    /// Idempotent. Runs that honour their cancellation token return promptly;
    /// `stop` cannot interrupt a task that ignores it.
    pub async fn stop(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.state = SchedulerState::Stopped;
        self.root.cancel();

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "Task loop terminated abnormally");
            }
        }
        info!("Scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

async fn run_task_loop(task: Arc<dyn Task>, interval: Duration, stop: CancellationToken) {
    let Some(first) = Instant::now().checked_add(interval) else {
        warn!(
            task = task.name(),
            interval_secs = interval.as_secs(),
            "Interval too large to schedule, task will never run"
        );
        stop.cancelled().await;
        return;
    };
    let mut ticker = time::interval_at(first, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        debug!(task = task.name(), run_id = %run_id, "Running task");

        match task.run(&stop).await {
            Ok(()) => {
                debug!(
                    task = task.name(),
                    run_id = %run_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Task run finished"
                );
            }
            Err(e) if stop.is_cancelled() && is_cancellation(&e) => {
                debug!(task = task.name(), run_id = %run_id, "Task run cancelled");
                break;
            }
            Err(e) => {
                error!(
                    task = task.name(),
                    run_id = %run_id,
                    error = %format!("{e:#}"),
                    "Task run failed"
                );
            }
        }
    }

    debug!(task = task.name(), "Task loop exited");
}
