use std::time::Duration;

use thiserror::Error;

/// Result type for declaration-time operations
pub type CronResult<T> = Result<T, CronError>;

/// Validation errors raised while declaring a schedule or job options
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CronError {
    #[error("Expected 5 or 6 cron fields, got {0}")]
    FieldCount(usize),

    #[error("Malformed {field} field: '{token}'")]
    Malformed { field: &'static str, token: String },

    #[error("Value {value} out of range for {field} ({min}-{max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Inverted range {start}-{end} in {field} field")]
    InvertedRange {
        field: &'static str,
        start: u32,
        end: u32,
    },

    #[error("Step must be positive in {field} field")]
    ZeroStep { field: &'static str },

    #[error("Priority must be between 1 and 10, got {0}")]
    PriorityOutOfRange(u8),

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Duplicate job name: {0}")]
    DuplicateJob(String),

    #[error("Schedule failed to compile: {0}")]
    Compile(String),
}

/// Job execution outcome - the distinguishing kind is timeout vs. failure
#[derive(Error, Debug, Clone)]
pub enum JobError {
    /// The attempt outlived its deadline. The underlying task is abandoned,
    /// not aborted.
    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    /// Anything else the handler reported.
    #[error("Job failed: {0}")]
    Failed(String),
}

impl JobError {
    /// Create a generic failure
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
