use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use parking_lot::RwLock;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{CronError, CronResult};
use crate::execution::JobExecution;
use crate::executor::JobExecutor;
use crate::job::{CronHandler, CronJobRecord};

type ErasedHandler = Arc<dyn CronHandler<Output = ()>>;
type ExecutionMap = Arc<RwLock<HashMap<String, JobExecution>>>;

/// Drives registered jobs on their schedules.
///
/// Interval timing comes from the compiled [`cron::Schedule`]; this type
/// only decides when a tick must be skipped and hands each invocation to
/// [`JobExecutor`]. This is where `max_concurrency` is enforced - the
/// executor itself never consults it.
pub struct CronRunner {
    jobs: Vec<(CronJobRecord, ErasedHandler)>,
    executions: ExecutionMap,
}

impl CronRunner {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            executions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a job record together with the handler its record names.
    ///
    /// The schedule is compiled eagerly so a bad record fails here rather
    /// than inside the job loop.
    pub fn register(&mut self, record: CronJobRecord, handler: ErasedHandler) -> CronResult<()> {
        if self.jobs.iter().any(|(r, _)| r.name == record.name) {
            return Err(CronError::DuplicateJob(record.name));
        }
        record.schedule.schedule()?;
        self.jobs.push((record, handler));
        Ok(())
    }

    /// Number of registered jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Spawn one loop per enabled job and return a shutdown handle.
    pub fn start(self) -> CronResult<RunnerHandle> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        for (record, handler) in self.jobs {
            if !record.options.enabled {
                debug!(job = %record.name, "Job disabled, not scheduling");
                continue;
            }

            let schedule = record.schedule.schedule()?;
            let tz = record.options.timezone.unwrap_or(chrono_tz::UTC);
            let semaphore = Arc::new(Semaphore::new(record.options.max_concurrency));
            let job = ScheduledJob {
                record: Arc::new(record),
                handler,
                schedule,
                tz,
                semaphore,
                executions: Arc::clone(&self.executions),
            };

            tasks.push(tokio::spawn(job.run(shutdown_rx.clone())));
        }

        Ok(RunnerHandle {
            shutdown_tx,
            tasks,
            executions: self.executions,
        })
    }
}

impl Default for CronRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for observing and stopping a started runner
pub struct RunnerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    executions: ExecutionMap,
}

impl RunnerHandle {
    /// Latest execution record for a job, if it has run
    pub fn last_execution(&self, job: &str) -> Option<JobExecution> {
        self.executions.read().get(job).cloned()
    }

    /// Stop all job loops. In-flight invocations are left to finish on
    /// their own tasks.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

struct ScheduledJob {
    record: Arc<CronJobRecord>,
    handler: ErasedHandler,
    schedule: cron::Schedule,
    tz: Tz,
    semaphore: Arc<Semaphore>,
    executions: ExecutionMap,
}

impl ScheduledJob {
    #[instrument(skip(self, shutdown), fields(job = %self.record.name))]
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(schedule = %self.record.schedule, "Scheduling job");

        if self.record.options.run_on_init {
            self.spawn_tick();
        }

        loop {
            let next = match self.schedule.upcoming(self.tz).next() {
                Some(next) => next,
                None => {
                    warn!("Schedule has no upcoming fire times, stopping loop");
                    return;
                }
            };

            let now = Utc::now().with_timezone(&self.tz);
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Job loop stopping");
                    return;
                }
                _ = tokio::time::sleep(wait) => {
                    self.spawn_tick();
                }
            }
        }
    }

    /// Fire one tick on its own task, skipping it when the concurrency cap
    /// is already saturated.
    fn spawn_tick(&self) {
        let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    job = %self.record.name,
                    max_concurrency = self.record.options.max_concurrency,
                    "Skipping tick: concurrency cap reached"
                );
                return;
            }
        };

        let record = Arc::clone(&self.record);
        let handler = Arc::clone(&self.handler);
        let executions = Arc::clone(&self.executions);

        tokio::spawn(async move {
            let mut execution = JobExecution::new(record.name.clone());
            let _ = JobExecutor::new()
                .execute(record.as_ref(), handler, &mut execution)
                .await;
            executions.write().insert(record.name.clone(), execution);
            drop(permit);
        });
    }
}
