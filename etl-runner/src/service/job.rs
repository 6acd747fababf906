//! Job runner
//!
//! Runs exactly one ETL cycle and turns whatever happens into a
//! [`JobOutcome`]:
//! - an error returned by the job becomes a failure carrying the error chain
//! - a panic inside the job becomes a failure carrying the panic message
//! - a run exceeding the timeout is aborted and becomes a failure
//!
//! Nothing escapes `run_once`, which is what lets the supervisor loop run
//! without its own error handling.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use etl_core::domain::outcome::JobOutcome;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// A single extract-transform-load unit
///
/// Implementations resolve their own configuration; the runner passes
/// nothing in and only looks at whether `execute` returned `Ok`.
#[async_trait]
pub trait EtlJob: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Performs one full ETL cycle
    async fn execute(&self) -> Result<()>;
}

/// Executes an [`EtlJob`] once per call and reports the outcome
pub struct JobRunner {
    job: Arc<dyn EtlJob>,
    timeout: Duration,
}

impl JobRunner {
    /// Creates a runner that aborts runs lasting longer than `timeout`
    pub fn new(job: Arc<dyn EtlJob>, timeout: Duration) -> Self {
        Self { job, timeout }
    }

    pub fn job_name(&self) -> &str {
        self.job.name()
    }

    /// Runs the job once
    ///
    /// The job body runs in its own task so that a panic surfaces as a
    /// `JoinError` instead of unwinding through the caller. The call only
    /// returns once that task has finished or been aborted. Dropping the
    /// returned future aborts the task as well.
    pub async fn run_once(&self) -> JobOutcome {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!("Starting {} run {}", self.job.name(), run_id);

        let job = Arc::clone(&self.job);
        let mut handle = AbortOnDropHandle::new(tokio::spawn(async move { job.execute().await }));

        let outcome = match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(()))) => JobOutcome::success(run_id, started_at),
            Ok(Ok(Err(e))) => JobOutcome::failure(run_id, started_at, format!("{:#}", e)),
            Ok(Err(e)) => JobOutcome::failure(run_id, started_at, describe_join_error(e)),
            Err(_) => {
                handle.abort();
                let _ = (&mut handle).await;
                JobOutcome::failure(
                    run_id,
                    started_at,
                    format!("{} timed out after {:?}", self.job.name(), self.timeout),
                )
            }
        };

        debug!(
            "Run {} finished in {:.2?} (success: {})",
            run_id,
            outcome.duration(),
            outcome.is_success()
        );

        outcome
    }
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        format!("job panicked: {}", panic_message(err.into_panic()))
    } else {
        "job task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// What a scripted job does on one call
    pub enum Step {
        Succeed,
        Fail(&'static str),
        Panic(&'static str),
        Hang,
    }

    /// Job that replays a script and records when it was invoked
    ///
    /// Once the script is exhausted the last step repeats.
    pub struct ScriptedJob {
        steps: Mutex<VecDeque<Step>>,
        last: Mutex<Option<Step>>,
        calls: Mutex<Vec<Instant>>,
        call_count: tokio::sync::watch::Sender<usize>,
    }

    impl ScriptedJob {
        pub fn new(steps: Vec<Step>) -> Arc<Self> {
            let (call_count, _) = tokio::sync::watch::channel(0);
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                last: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
                call_count,
            })
        }

        pub fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }

        /// Resolves once the job has been invoked at least `n` times
        pub fn invoked(&self, n: usize) -> impl Future<Output = ()> + Send + use<> {
            let mut rx = self.call_count.subscribe();
            async move {
                let _ = rx.wait_for(|count| *count >= n).await;
            }
        }

        fn next_step(&self) -> Step {
            let mut steps = self.steps.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match steps.pop_front() {
                Some(step) => {
                    *last = Some(step.replay());
                    step
                }
                None => last.as_ref().map(Step::replay).unwrap_or(Step::Succeed),
            }
        }
    }

    impl Step {
        fn replay(&self) -> Step {
            match self {
                Step::Succeed => Step::Succeed,
                Step::Fail(m) => Step::Fail(*m),
                Step::Panic(m) => Step::Panic(*m),
                Step::Hang => Step::Hang,
            }
        }
    }

    #[async_trait]
    impl EtlJob for ScriptedJob {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn execute(&self) -> Result<()> {
            self.calls.lock().unwrap().push(Instant::now());
            self.call_count.send_modify(|count| *count += 1);

            match self.next_step() {
                Step::Succeed => Ok(()),
                Step::Fail(message) => Err(anyhow::anyhow!(message)),
                Step::Panic(message) => panic!("{}", message),
                Step::Hang => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
            }
        }
    }

    fn runner(steps: Vec<Step>) -> (JobRunner, Arc<ScriptedJob>) {
        let job = ScriptedJob::new(steps);
        let runner = JobRunner::new(job.clone(), Duration::from_secs(3600));
        (runner, job)
    }

    #[tokio::test]
    async fn test_success_outcome() {
        let (runner, job) = runner(vec![Step::Succeed]);

        let outcome = runner.run_once().await;

        assert!(outcome.is_success());
        assert_eq!(outcome.diagnostic(), None);
        assert_eq!(job.calls().len(), 1);
        assert_eq!(runner.job_name(), "scripted");
    }

    #[tokio::test]
    async fn test_error_becomes_failure() {
        let (runner, _) = runner(vec![Step::Fail("connection refused")]);

        let outcome = runner.run_once().await;

        assert!(outcome.is_failure());
        assert_eq!(outcome.diagnostic(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_error_chain_is_kept() {
        struct ContextJob;

        #[async_trait]
        impl EtlJob for ContextJob {
            fn name(&self) -> &str {
                "context"
            }

            async fn execute(&self) -> Result<()> {
                use anyhow::Context;
                Err(anyhow::anyhow!("connection refused"))
                    .context("Failed to connect to PostgreSQL")
            }
        }

        let runner = JobRunner::new(Arc::new(ContextJob), Duration::from_secs(5));
        let outcome = runner.run_once().await;

        assert_eq!(
            outcome.diagnostic(),
            Some("Failed to connect to PostgreSQL: connection refused")
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let (runner, _) = runner(vec![Step::Panic("index out of bounds")]);

        let outcome = runner.run_once().await;

        assert!(outcome.is_failure());
        let diagnostic = outcome.diagnostic().unwrap();
        assert!(diagnostic.contains("panicked"));
        assert!(diagnostic.contains("index out of bounds"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failure() {
        let job = ScriptedJob::new(vec![Step::Hang]);
        let runner = JobRunner::new(job.clone(), Duration::from_secs(30));
        let start = Instant::now();

        let outcome = runner.run_once().await;

        assert!(outcome.is_failure());
        assert!(outcome.diagnostic().unwrap().contains("timed out"));
        assert!(start.elapsed() >= Duration::from_secs(30));
        // the aborted task has released its handle on the job
        assert_eq!(Arc::strong_count(&job), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_a_run_aborts_the_job() {
        let job = ScriptedJob::new(vec![Step::Hang]);
        let runner = JobRunner::new(job.clone(), Duration::from_secs(3600));

        let cancelled = tokio::time::timeout(Duration::from_secs(1), runner.run_once()).await;
        assert!(cancelled.is_err());
        assert_eq!(job.calls().len(), 1);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(Arc::strong_count(&job), 2);
    }

    #[tokio::test]
    async fn test_each_run_gets_its_own_outcome() {
        let (runner, job) = runner(vec![Step::Fail("boom"), Step::Succeed]);

        let first = runner.run_once().await;
        let second = runner.run_once().await;

        assert!(first.is_failure());
        assert!(second.is_success());
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(job.calls().len(), 2);
    }
}
