use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single job run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub String);

impl ExecutionId {
    /// Generate a new unique execution ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ExecutionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ExecutionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Outcome state of a scheduled job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// An attempt is in flight
    Running,

    /// The handler resolved successfully
    Completed,

    /// All attempts failed; the last failure was not a timeout
    Failed,

    /// All attempts failed; the last failure was a timeout
    TimedOut,
}

impl ExecutionStatus {
    /// Check if the run reached a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Get the status name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timeout",
        }
    }
}

/// Ephemeral per-invocation state of a scheduled job run.
///
/// Tracks attempt count, timing, and outcome; the executor mutates it as the
/// run progresses and observers receive it through the job callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    /// Unique run identifier
    pub execution_id: ExecutionId,

    /// Name of the job being run
    pub job_name: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,

    /// Current attempt number (1-based once the first attempt begins)
    pub attempt: u32,

    /// Current run status
    pub status: ExecutionStatus,

    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl JobExecution {
    /// Create a fresh execution record for a job
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            execution_id: ExecutionId::new(),
            job_name: job_name.into(),
            started_at: Utc::now(),
            finished_at: None,
            attempt: 0,
            status: ExecutionStatus::Running,
            last_error: None,
        }
    }

    /// Start the next attempt
    pub fn begin_attempt(&mut self) {
        self.attempt += 1;
        self.status = ExecutionStatus::Running;
    }

    /// Mark the run as completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// Mark the run as permanently failed
    pub fn fail(&mut self, error: String) {
        self.status = ExecutionStatus::Failed;
        self.last_error = Some(error);
        self.finished_at = Some(Utc::now());
    }

    /// Mark the run as timed out
    pub fn time_out(&mut self, error: String) {
        self.status = ExecutionStatus::TimedOut;
        self.last_error = Some(error);
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run, once finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        let mut exec = JobExecution::new("cleanup");
        assert_eq!(exec.attempt, 0);
        assert_eq!(exec.status, ExecutionStatus::Running);
        assert!(!exec.status.is_terminal());

        exec.begin_attempt();
        assert_eq!(exec.attempt, 1);

        exec.complete();
        assert_eq!(exec.status, ExecutionStatus::Completed);
        assert!(exec.status.is_terminal());
        assert!(exec.duration().is_some());
    }

    #[test]
    fn timeout_has_its_own_status_name() {
        let mut exec = JobExecution::new("report");
        exec.begin_attempt();
        exec.time_out("deadline".to_string());
        assert_eq!(exec.status.name(), "timeout");
        assert_eq!(exec.last_error.as_deref(), Some("deadline"));
    }
}
