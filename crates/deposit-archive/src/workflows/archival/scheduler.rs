use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::clock::Clock;
use super::domain::RunReport;
use super::guard::{GuardError, RunGuard};
use super::job::{ArchivalError, ArchivalJob};

/// When the scheduler is allowed to attempt a run and how long it waits
/// between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    /// Poll every `poll_interval`; only run between `start_hour` (inclusive)
    /// and `end_hour` (exclusive) local time.
    Window {
        start_hour: u32,
        end_hour: u32,
        poll_interval: Duration,
    },
    /// Run as soon as possible, then sleep until the next local midnight.
    /// Failed runs are retried after `retry_backoff`.
    Midnight { retry_backoff: Duration },
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        SchedulePolicy::Window {
            start_hour: 1,
            end_hour: 2,
            poll_interval: Duration::from_secs(60),
        }
    }
}

impl SchedulePolicy {
    pub fn permits(&self, now: NaiveDateTime) -> bool {
        match *self {
            SchedulePolicy::Window {
                start_hour,
                end_hour,
                ..
            } => (start_hour..end_hour).contains(&now.hour()),
            SchedulePolicy::Midnight { .. } => true,
        }
    }

    pub fn next_delay(&self, outcome: &TickOutcome, now: NaiveDateTime) -> Duration {
        match *self {
            SchedulePolicy::Window { poll_interval, .. } => poll_interval,
            SchedulePolicy::Midnight { retry_backoff } => match outcome {
                TickOutcome::Failed(_) | TickOutcome::Skipped(SkipReason::InProgress) => {
                    retry_backoff
                }
                _ => until_next_midnight(now),
            },
        }
    }
}

fn until_next_midnight(now: NaiveDateTime) -> Duration {
    now.date()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight - now)
        .and_then(|remaining| remaining.to_std().ok())
        .unwrap_or(Duration::ZERO)
}

/// Why a tick did not start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InProgress,
    OutsideWindow,
    AlreadyRanToday,
}

#[derive(Debug)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Completed(RunReport),
    Failed(RunFailure),
}

impl TickOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TickOutcome::Completed(_))
    }
}

/// Failure contained at the run boundary.
#[derive(Debug, thiserror::Error)]
pub enum RunFailure {
    #[error(transparent)]
    Run(#[from] ArchivalError),
    #[error("run marker unavailable: {0}")]
    Guard(#[from] GuardError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum RunState {
    #[default]
    Idle,
    Running,
}

/// Marks the scheduler as running for as long as it is alive and resets the
/// state on drop, whichever way the run exits.
struct RunningScope<'a> {
    state: &'a mut RunState,
}

impl<'a> RunningScope<'a> {
    fn enter(state: &'a mut RunState) -> Option<Self> {
        if *state == RunState::Running {
            return None;
        }
        *state = RunState::Running;
        Some(Self { state })
    }
}

impl Drop for RunningScope<'_> {
    fn drop(&mut self) {
        *self.state = RunState::Idle;
    }
}

/// Drives the archival job at most once per calendar day.
pub struct ArchiveScheduler {
    job: ArchivalJob,
    guard: RunGuard,
    policy: SchedulePolicy,
    clock: Arc<dyn Clock>,
    state: RunState,
    /// Date of the last run this instance committed, kept even when the
    /// shared marker could not be written.
    last_completed: Option<NaiveDate>,
}

impl ArchiveScheduler {
    pub fn new(
        job: ArchivalJob,
        guard: RunGuard,
        policy: SchedulePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            job,
            guard,
            policy,
            clock,
            state: RunState::Idle,
            last_completed: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Evaluate the schedule once and run the job if it is due.
    pub async fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();
        if !self.policy.permits(now) {
            return TickOutcome::Skipped(SkipReason::OutsideWindow);
        }
        self.attempt(now, false).await
    }

    /// Run immediately, ignoring the clock window. Unless `force` is set, a
    /// run already recorded for today still short-circuits.
    pub async fn run_now(&mut self, force: bool) -> TickOutcome {
        let now = self.clock.now();
        self.attempt(now, force).await
    }

    /// Loop until `shutdown` is cancelled. Cancellation interrupts the wait
    /// between ticks; a run that has already started is allowed to finish.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(policy = ?self.policy, "deposit archival scheduler started");

        while !shutdown.is_cancelled() {
            let outcome = self.tick().await;
            let delay = self.policy.next_delay(&outcome, self.clock.now());
            debug!(?delay, "scheduler sleeping");

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("deposit archival scheduler stopped");
    }

    async fn attempt(&mut self, now: NaiveDateTime, force: bool) -> TickOutcome {
        if self.is_running() {
            return TickOutcome::Skipped(SkipReason::InProgress);
        }

        if !force {
            if self.last_completed == Some(now.date()) {
                debug!("deposit archival already committed today by this instance");
                return TickOutcome::Skipped(SkipReason::AlreadyRanToday);
            }

            match self.guard.last_run_date().await {
                Ok(Some(last)) if last == now.date() => {
                    debug!(%last, "deposit archival already ran today");
                    return TickOutcome::Skipped(SkipReason::AlreadyRanToday);
                }
                Ok(_) => {}
                Err(err) => {
                    error!(error = %err, "unable to read run marker; skipping tick");
                    return TickOutcome::Failed(err.into());
                }
            }
        }

        let Some(_running) = RunningScope::enter(&mut self.state) else {
            return TickOutcome::Skipped(SkipReason::InProgress);
        };

        info!(%now, force, "deposit archival run starting");
        let report = match self.job.execute(now).await {
            Ok(report) => report,
            Err(err) => {
                error!(error = %err, "deposit archival run failed; will retry on a later tick");
                return TickOutcome::Failed(err.into());
            }
        };

        self.last_completed = Some(now.date());

        if let Err(err) = self.guard.record(now).await {
            error!(error = %err, "run committed but the run marker was not advanced");
            return TickOutcome::Failed(err.into());
        }

        TickOutcome::Completed(report)
    }
}
