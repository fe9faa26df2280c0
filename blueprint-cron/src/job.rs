use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CronResult, JobError};
use crate::expr::CronExpr;
use crate::options::JobOptions;

/// Stored descriptor mapping a schedule and options to a handler name.
///
/// The record itself is pure metadata: the handler field names an
/// implementation that a runtime reader pairs up later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronJobRecord {
    /// Job name, unique within its declaring scope
    pub name: String,

    /// Validated schedule expression
    pub schedule: CronExpr,

    /// Name of the handler that runs the job
    pub handler: String,

    /// Execution options
    pub options: JobOptions,
}

impl CronJobRecord {
    /// Create a record, parsing and validating the expression
    pub fn new(
        name: impl Into<String>,
        expression: &str,
        handler: impl Into<String>,
    ) -> CronResult<Self> {
        Ok(Self {
            name: name.into(),
            schedule: CronExpr::parse(expression)?,
            handler: handler.into(),
            options: JobOptions::default(),
        })
    }

    /// Replace the options
    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = options;
        self
    }
}

/// A schedulable unit of work.
///
/// The runner stores handlers type-erased as `dyn CronHandler<Output = ()>`;
/// the executor stays generic so direct callers keep their typed result.
#[async_trait]
pub trait CronHandler: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn run(&self) -> Result<Self::Output, JobError>;
}

/// Adapter so plain async closures can serve as handlers
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CronHandler for FnHandler<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    type Output = ();

    async fn run(&self) -> Result<(), JobError> {
        (self.0)().await
    }
}

/// Wrap an async closure as a [`CronHandler`]
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    FnHandler(f)
}
