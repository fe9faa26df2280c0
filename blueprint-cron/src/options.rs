use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CronError, CronResult, JobError};
use crate::execution::JobExecution;

/// Job priority, 1 (lowest) through 10 (highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct JobPriority(u8);

impl JobPriority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Create a priority, rejecting values outside 1-10
    pub fn new(value: u8) -> CronResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(CronError::PriorityOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Get the numeric value
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for JobPriority {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for JobPriority {
    type Error = CronError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobPriority> for u8 {
    fn from(priority: JobPriority) -> Self {
        priority.0
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observer fired on attempt start and on completion
pub type JobObserver = Arc<dyn Fn(&JobExecution) + Send + Sync>;

/// Observer fired when a run fails permanently
pub type JobErrorObserver = Arc<dyn Fn(&JobExecution, &JobError) + Send + Sync>;

/// Per-job configuration.
///
/// Everything is optional at declaration time; defaults match a job that
/// runs once per fire time with no retries and no deadline.
#[derive(Clone, Serialize, Deserialize)]
pub struct JobOptions {
    /// Timezone the schedule is evaluated in (UTC when unset)
    pub timezone: Option<Tz>,

    /// Run once immediately when the scheduler starts
    pub run_on_init: bool,

    /// Human-readable description
    pub description: Option<String>,

    /// Disabled jobs are recorded but never scheduled
    pub enabled: bool,

    /// Concurrent runs allowed for this job; ticks beyond the cap are
    /// skipped by the runner, never queued
    pub max_concurrency: usize,

    /// Deadline for a single attempt
    pub timeout: Option<Duration>,

    /// Scheduling priority, 1-10
    pub priority: JobPriority,

    /// Extra attempts after a failure
    pub retry_attempts: u32,

    /// Delay between attempts
    pub retry_delay: Duration,

    /// Fired at the start of every attempt
    #[serde(skip)]
    pub on_start: Option<JobObserver>,

    /// Fired once the run completes successfully
    #[serde(skip)]
    pub on_complete: Option<JobObserver>,

    /// Fired when the run fails permanently
    #[serde(skip)]
    pub on_error: Option<JobErrorObserver>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            timezone: None,
            run_on_init: false,
            description: None,
            enabled: true,
            max_concurrency: 1,
            timeout: None,
            priority: JobPriority::default(),
            retry_attempts: 0,
            retry_delay: Duration::from_millis(1000),
            on_start: None,
            on_complete: None,
            on_error: None,
        }
    }
}

impl JobOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timezone by IANA name
    pub fn with_timezone(mut self, timezone: &str) -> CronResult<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| CronError::UnknownTimezone(timezone.to_string()))?;
        self.timezone = Some(tz);
        Ok(self)
    }

    /// Run once immediately when the scheduler starts
    pub fn run_on_init(mut self) -> Self {
        self.run_on_init = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record the job without ever scheduling it
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the concurrent-run cap; must be at least 1
    pub fn with_max_concurrency(mut self, max: usize) -> CronResult<Self> {
        if max == 0 {
            return Err(CronError::ZeroConcurrency);
        }
        self.max_concurrency = max;
        Ok(self)
    }

    /// Set the per-attempt deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the priority, rejecting values outside 1-10
    pub fn with_priority(mut self, priority: u8) -> CronResult<Self> {
        self.priority = JobPriority::new(priority)?;
        Ok(self)
    }

    /// Set the retry policy: extra attempts and the delay between them
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn on_start(mut self, observer: JobObserver) -> Self {
        self.on_start = Some(observer);
        self
    }

    pub fn on_complete(mut self, observer: JobObserver) -> Self {
        self.on_complete = Some(observer);
        self
    }

    pub fn on_error(mut self, observer: JobErrorObserver) -> Self {
        self.on_error = Some(observer);
        self
    }
}

impl fmt::Debug for JobOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobOptions")
            .field("timezone", &self.timezone)
            .field("run_on_init", &self.run_on_init)
            .field("description", &self.description)
            .field("enabled", &self.enabled)
            .field("max_concurrency", &self.max_concurrency)
            .field("timeout", &self.timeout)
            .field("priority", &self.priority)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("on_start", &self.on_start.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_contract() {
        let opts = JobOptions::default();
        assert!(opts.enabled);
        assert_eq!(opts.max_concurrency, 1);
        assert_eq!(opts.priority.get(), 5);
        assert_eq!(opts.retry_attempts, 0);
        assert_eq!(opts.retry_delay, Duration::from_millis(1000));
        assert!(opts.timeout.is_none());
        assert!(!opts.run_on_init);
    }

    #[test]
    fn priority_bounds_are_enforced() {
        assert!(JobPriority::new(1).is_ok());
        assert!(JobPriority::new(10).is_ok());
        assert_eq!(
            JobPriority::new(0).unwrap_err(),
            CronError::PriorityOutOfRange(0)
        );
        assert_eq!(
            JobPriority::new(11).unwrap_err(),
            CronError::PriorityOutOfRange(11)
        );
        assert!(JobOptions::new().with_priority(11).is_err());
    }

    #[test]
    fn timezone_names_are_validated() {
        let opts = JobOptions::new().with_timezone("Europe/Berlin").unwrap();
        assert_eq!(opts.timezone, Some(chrono_tz::Europe::Berlin));
        assert_eq!(
            JobOptions::new().with_timezone("Mars/Olympus").unwrap_err(),
            CronError::UnknownTimezone("Mars/Olympus".to_string())
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert_eq!(
            JobOptions::new().with_max_concurrency(0).unwrap_err(),
            CronError::ZeroConcurrency
        );
    }
}
