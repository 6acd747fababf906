//! Supervisor loop
//!
//! Invokes the job runner forever, alternating between two phases:
//! - Running: one `run_once()` call, awaited to completion
//! - Sleeping: `success_delay` after a success, `failure_delay` (plus a log
//!   line with the failure detail) after a failure
//!
//! There is no retry limit. The loop only ends when the shutdown future
//! passed to [`Supervisor::run_until`] resolves. That is observed in both
//! phases: an in-flight run is aborted mid-state, a sleep is cut short.

use etl_core::domain::outcome::JobStatus;
use tokio::time::{self, Duration};
use tracing::{debug, error, info};

use super::policy::{RetryPolicy, failure_message, format_delay};
use crate::service::JobRunner;

/// Which half of the cycle the supervisor is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Sleeping,
}

/// Loop bookkeeping, owned by the [`Supervisor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorState {
    pub phase: Phase,
    /// Number of runs started so far, only ever increases
    pub iterations: u64,
    /// Failures since the last success
    pub consecutive_failures: u32,
}

impl SupervisorState {
    fn new() -> Self {
        Self {
            phase: Phase::Running,
            iterations: 0,
            consecutive_failures: 0,
        }
    }
}

/// Runs the ETL job over and over, sleeping between runs
pub struct Supervisor {
    runner: JobRunner,
    policy: RetryPolicy,
    state: SupervisorState,
}

impl Supervisor {
    /// Creates a new supervisor
    pub fn new(runner: JobRunner, policy: RetryPolicy) -> Self {
        Self {
            runner,
            policy,
            state: SupervisorState::new(),
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    /// Runs forever
    pub async fn run(&mut self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Runs until `shutdown` resolves
    ///
    /// `shutdown` is raced against both the run and the sleep between runs.
    /// A run in progress when it resolves is aborted and counts as started
    /// but never reports an outcome.
    ///
    /// # Returns
    /// The number of runs performed
    pub async fn run_until<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting supervisor for {} (success delay: {:?}, failure delay: {:?}, backoff: {:?})",
            self.runner.job_name(),
            self.policy.success_delay,
            self.policy.failure_delay,
            self.policy.backoff
        );

        tokio::pin!(shutdown);

        loop {
            let delay = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(
                        "Shutdown requested, aborting in-flight run after {} run(s) started",
                        self.state.iterations
                    );
                    break;
                }
                delay = self.step() => delay,
            };

            self.state.phase = Phase::Sleeping;
            debug!("Sleeping {} before the next run", format_delay(delay));

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(
                        "Shutdown requested, stopping supervisor after {} run(s)",
                        self.state.iterations
                    );
                    break;
                }
                _ = time::sleep(delay) => {}
            }
        }

        self.state.iterations
    }

    /// Performs one run and returns how long to sleep afterwards
    pub async fn step(&mut self) -> Duration {
        self.state.phase = Phase::Running;
        self.state.iterations += 1;

        let outcome = self.runner.run_once().await;

        match &outcome.status {
            JobStatus::Success => {
                self.state.consecutive_failures = 0;
                info!(
                    "ETL run {} (#{}) succeeded in {:.2?}",
                    outcome.run_id,
                    self.state.iterations,
                    outcome.duration()
                );
                self.policy.success_delay
            }
            JobStatus::Failure { diagnostic } => {
                self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
                let delay = self.policy.failure_delay_for(self.state.consecutive_failures);
                error!("{}", failure_message(delay, diagnostic));
                debug!(
                    "ETL run {} (#{}) failed after {:.2?}, {} consecutive failure(s)",
                    outcome.run_id,
                    self.state.iterations,
                    outcome.duration(),
                    self.state.consecutive_failures
                );
                delay
            }
        }
    }
}
