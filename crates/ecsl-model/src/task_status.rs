use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one launch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not submitted yet.
    NotLaunched,
    /// Submission in progress, possibly waiting out a retryable rejection.
    Launching,
    /// Accepted by the remote API; no describe issued yet.
    Launched,
    /// Waiting for the remote task to stop.
    Polling,
    /// Stopped with every container exiting cleanly.
    Succeeded,
    /// Fatal launch error, non-zero container exit, or too many polling errors.
    Failed,
    /// Stopped locally through the cancellation token.
    Cancelled,
    /// Deadline elapsed before a terminal state was observed.
    TimedOut,
}

impl TaskStatus {
    /// Returns `true` if no further transition can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Cancelled | TaskStatus::TimedOut
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotLaunched => "not_launched",
            TaskStatus::Launching => "launching",
            TaskStatus::Launched => "launched",
            TaskStatus::Polling => "polling",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
