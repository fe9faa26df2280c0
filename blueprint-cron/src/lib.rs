//! # blueprint-cron: Scheduled jobs for Blueprint
//!
//! Cron-style job declarations with validation at declaration time and a
//! small runtime on top:
//!
//! - **Expressions**: 5 or 6 whitespace-separated fields (seconds optional,
//!   prepended), each accepting `*`, `?`, values, ranges, steps, and comma
//!   lists, validated against per-field ranges when declared.
//! - **Executor**: runs one invocation with retry and timeout semantics; a
//!   timed-out attempt is abandoned, never aborted.
//! - **Runner**: delegates interval timing to the `cron` crate and enforces
//!   `max_concurrency` by skipping saturated ticks.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use blueprint_cron::{handler_fn, CronJobRecord, CronRunner, JobOptions};
//!
//! # async fn demo() -> Result<(), blueprint_cron::CronError> {
//! let record = CronJobRecord::new("nightly_cleanup", "0 3 * * *", "purge_expired")?
//!     .with_options(JobOptions::new().with_retry(2, std::time::Duration::from_secs(5)));
//!
//! let mut runner = CronRunner::new();
//! runner.register(record, Arc::new(handler_fn(|| async {
//!     // purge expired rows
//!     Ok(())
//! })))?;
//!
//! let handle = runner.start()?;
//! # handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod execution;
pub mod executor;
pub mod expr;
pub mod job;
pub mod options;
pub mod runner;

pub use error::{CronError, CronResult, JobError};
pub use execution::{ExecutionId, ExecutionStatus, JobExecution};
pub use executor::JobExecutor;
pub use expr::{CronExpr, CronField, FieldKind};
pub use job::{handler_fn, CronHandler, CronJobRecord, FnHandler};
pub use options::{JobErrorObserver, JobObserver, JobOptions, JobPriority};
pub use runner::{CronRunner, RunnerHandle};

/// Commonly used types for declaring and running scheduled jobs
pub mod prelude {
    pub use crate::{
        handler_fn, CronError, CronExpr, CronHandler, CronJobRecord, CronResult, CronRunner,
        JobError, JobExecution, JobExecutor, JobOptions,
    };

    pub use async_trait::async_trait;
}
