use std::time::Duration;

use crate::error::CoreError;

/// Delay between launch retries.
pub const DEFAULT_LAUNCH_BACKOFF: Duration = Duration::from_secs(30);
/// Delay between describe calls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Fixed wait before resubmitting a retryable launch.
    pub launch_backoff: Duration,
    /// Fixed wait between describe calls.
    pub poll_interval: Duration,
    /// Number of lifecycles allowed to run at once.
    ///
    /// `None` starts one unit per request immediately.
    pub max_concurrency: Option<usize>,
    /// Per-task limit measured from the moment its lifecycle starts.
    pub deadline: Option<Duration>,
    /// Consecutive describe errors tolerated before the task is marked failed.
    ///
    /// `None` keeps polling through errors indefinitely.
    pub max_poll_errors: Option<u32>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            launch_backoff: DEFAULT_LAUNCH_BACKOFF,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_concurrency: None,
            deadline: None,
            max_poll_errors: None,
        }
    }
}

impl LauncherConfig {
    pub fn with_launch_backoff(mut self, backoff: Duration) -> Self {
        self.launch_backoff = backoff;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = Some(workers);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_poll_errors(mut self, errors: u32) -> Self {
        self.max_poll_errors = Some(errors);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.launch_backoff.is_zero() {
            return Err(CoreError::InvalidConfig("launch_backoff must be > 0".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::InvalidConfig("poll_interval must be > 0".into()));
        }
        if self.max_concurrency == Some(0) {
            return Err(CoreError::InvalidConfig("max_concurrency must be > 0".into()));
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(CoreError::InvalidConfig("deadline must be > 0".into()));
        }
        if self.max_poll_errors == Some(0) {
            return Err(CoreError::InvalidConfig("max_poll_errors must be > 0".into()));
        }
        Ok(())
    }
}
