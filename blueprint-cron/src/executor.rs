use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::error::JobError;
use crate::execution::JobExecution;
use crate::job::{CronHandler, CronJobRecord};

/// Runs one scheduled invocation with the retry and timeout policy from the
/// job's options.
///
/// Concurrency capping is deliberately not done here; the runner owns the
/// per-job semaphore.
#[derive(Debug, Default)]
pub struct JobExecutor;

impl JobExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run the handler, retrying on failure up to `retry_attempts` extra
    /// times with `retry_delay` between attempts, racing each attempt
    /// against `timeout` when one is set.
    ///
    /// On success the execution record is marked completed and the handler's
    /// result is returned. Once attempts are exhausted the record is marked
    /// timed-out or failed depending on the last error, which is then
    /// returned to the caller.
    #[instrument(skip(self, handler, execution), fields(job = %record.name, handler = %record.handler))]
    pub async fn execute<H>(
        &self,
        record: &CronJobRecord,
        handler: Arc<H>,
        execution: &mut JobExecution,
    ) -> Result<H::Output, JobError>
    where
        H: CronHandler + ?Sized,
    {
        let opts = &record.options;
        let max_attempts = opts.retry_attempts + 1;

        loop {
            execution.begin_attempt();
            if let Some(observer) = &opts.on_start {
                observer(execution);
            }

            match run_attempt(Arc::clone(&handler), opts.timeout).await {
                Ok(output) => {
                    execution.complete();
                    if let Some(observer) = &opts.on_complete {
                        observer(execution);
                    }
                    info!(attempt = execution.attempt, "Job completed");
                    return Ok(output);
                }
                Err(err) if execution.attempt < max_attempts => {
                    warn!(
                        attempt = execution.attempt,
                        error = %err,
                        "Job attempt failed, retrying after delay"
                    );
                    sleep(opts.retry_delay).await;
                }
                Err(err) => {
                    match &err {
                        JobError::Timeout(_) => execution.time_out(err.to_string()),
                        JobError::Failed(_) => execution.fail(err.to_string()),
                    }
                    if let Some(observer) = &opts.on_error {
                        observer(execution, &err);
                    }
                    error!(attempt = execution.attempt, error = %err, "Job failed permanently");
                    return Err(err);
                }
            }
        }
    }
}

/// One attempt. The handler runs on its own task so a timed-out attempt is
/// abandoned, not aborted; its eventual result is simply ignored.
async fn run_attempt<H>(handler: Arc<H>, timeout: Option<Duration>) -> Result<H::Output, JobError>
where
    H: CronHandler + ?Sized,
{
    let mut task = tokio::spawn(async move { handler.run().await });

    let joined = match timeout {
        Some(limit) => {
            tokio::select! {
                joined = &mut task => joined,
                _ = sleep(limit) => {
                    debug!(?limit, "Attempt hit its deadline, abandoning the running task");
                    return Err(JobError::Timeout(limit));
                }
            }
        }
        None => task.await,
    };

    match joined {
        Ok(result) => result,
        Err(join_err) => Err(JobError::Failed(format!("Handler task died: {join_err}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    use async_trait::async_trait;

    use super::*;
    use crate::execution::ExecutionStatus;
    use crate::options::JobOptions;

    struct FlakyJob {
        calls: Arc<AtomicU32>,
        succeed_on: u32,
    }

    #[async_trait]
    impl CronHandler for FlakyJob {
        type Output = &'static str;

        async fn run(&self) -> Result<Self::Output, JobError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok("done")
            } else {
                Err(JobError::failed("not yet"))
            }
        }
    }

    struct StuckJob;

    #[async_trait]
    impl CronHandler for StuckJob {
        type Output = ();

        async fn run(&self) -> Result<(), JobError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn record_with(options: JobOptions) -> CronJobRecord {
        CronJobRecord::new("test_job", "* * * * *", "run_test")
            .unwrap()
            .with_options(options)
    }

    #[tokio::test]
    async fn success_returns_the_handler_result() {
        let calls = Arc::new(AtomicU32::new(0));
        let handler = Arc::new(FlakyJob {
            calls: Arc::clone(&calls),
            succeed_on: 1,
        });
        let record = record_with(JobOptions::default());
        let mut execution = JobExecution::new(&record.name);

        let result = JobExecutor::new()
            .execute(&record, handler, &mut execution)
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.attempt, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_job_runs_exactly_attempts_plus_one_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let handler = Arc::new(FlakyJob {
            calls: Arc::clone(&calls),
            succeed_on: u32::MAX,
        });
        let record = record_with(
            JobOptions::new().with_retry(2, Duration::from_millis(10)),
        );
        let mut execution = JobExecution::new(&record.name);

        let result = JobExecutor::new()
            .execute(&record, handler, &mut execution)
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(execution.attempt, 3);
        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert!(execution.last_error.as_deref().unwrap().contains("not yet"));
    }

    #[tokio::test]
    async fn retry_then_succeed_keeps_the_attempt_count() {
        let calls = Arc::new(AtomicU32::new(0));
        let handler = Arc::new(FlakyJob {
            calls: Arc::clone(&calls),
            succeed_on: 2,
        });
        let record = record_with(
            JobOptions::new().with_retry(3, Duration::from_millis(10)),
        );
        let mut execution = JobExecution::new(&record.name);

        let result = JobExecutor::new()
            .execute(&record, handler, &mut execution)
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(execution.attempt, 2);
        assert_eq!(execution.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn stuck_handler_reports_timeout_after_the_deadline() {
        let record = record_with(
            JobOptions::new().with_timeout(Duration::from_millis(50)),
        );
        let mut execution = JobExecution::new(&record.name);
        let started = Instant::now();

        let result = JobExecutor::new()
            .execute(&record, Arc::new(StuckJob), &mut execution)
            .await;

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(matches!(result.unwrap_err(), JobError::Timeout(_)));
        assert_eq!(execution.status, ExecutionStatus::TimedOut);
        assert_eq!(execution.status.name(), "timeout");
    }

    #[tokio::test]
    async fn observers_fire_per_attempt_and_on_terminal_outcome() {
        let starts = Arc::new(AtomicU32::new(0));
        let completes = Arc::new(AtomicU32::new(0));
        let errors = Arc::new(AtomicU32::new(0));

        let options = {
            let starts = Arc::clone(&starts);
            let completes = Arc::clone(&completes);
            let errors = Arc::clone(&errors);
            JobOptions::new()
                .with_retry(1, Duration::from_millis(10))
                .on_start(Arc::new(move |_| {
                    starts.fetch_add(1, Ordering::SeqCst);
                }))
                .on_complete(Arc::new(move |_| {
                    completes.fetch_add(1, Ordering::SeqCst);
                }))
                .on_error(Arc::new(move |_, _| {
                    errors.fetch_add(1, Ordering::SeqCst);
                }))
        };

        let calls = Arc::new(AtomicU32::new(0));
        let handler = Arc::new(FlakyJob {
            calls,
            succeed_on: u32::MAX,
        });
        let record = record_with(options);
        let mut execution = JobExecution::new(&record.name);

        let result = JobExecutor::new()
            .execute(&record, handler, &mut execution)
            .await;

        assert!(result.is_err());
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(completes.load(Ordering::SeqCst), 0);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn type_erased_handlers_execute() {
        let handler: Arc<dyn CronHandler<Output = ()>> =
            Arc::new(crate::job::handler_fn(|| async { Ok(()) }));
        let record = record_with(JobOptions::default());
        let mut execution = JobExecution::new(&record.name);

        let result = JobExecutor::new()
            .execute(&record, handler, &mut execution)
            .await;

        assert!(result.is_ok());
        assert_eq!(execution.status, ExecutionStatus::Completed);
    }
}
