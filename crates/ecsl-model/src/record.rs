use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{TaskReference, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid transition: {from} -> {to}")]
    Invalid { from: TaskStatus, to: TaskStatus },
    #[error("task reference already set to {0}")]
    ReferenceAlreadySet(TaskReference),
    #[error("{0} is not a terminal status")]
    NotTerminal(TaskStatus),
}

/// Mutable state of a single lifecycle.
///
/// Owned by exactly one lifecycle; everyone else sees clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Remote reference, set once when the launch is accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<TaskReference>,
    pub status: TaskStatus,
    /// Error that ended the lifecycle, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Number of launch submissions made.
    pub launch_attempts: u32,
    /// Number of describe calls made.
    pub polls: u32,
}

impl TaskRecord {
    pub fn new() -> Self {
        Self {
            reference: None,
            status: TaskStatus::NotLaunched,
            last_error: None,
            launch_attempts: 0,
            polls: 0,
        }
    }

    /// Records one submission attempt.
    pub fn begin_launch(&mut self) -> Result<(), TransitionError> {
        self.expect(&[TaskStatus::NotLaunched, TaskStatus::Launching], TaskStatus::Launching)?;
        self.status = TaskStatus::Launching;
        self.launch_attempts += 1;
        Ok(())
    }

    /// Launching -> Launched. The reference can only be assigned here, once.
    pub fn mark_launched(&mut self, reference: TaskReference) -> Result<(), TransitionError> {
        if let Some(existing) = &self.reference {
            return Err(TransitionError::ReferenceAlreadySet(existing.clone()));
        }
        self.expect(&[TaskStatus::Launching], TaskStatus::Launched)?;
        self.reference = Some(reference);
        self.status = TaskStatus::Launched;
        Ok(())
    }

    /// Records one describe call.
    pub fn begin_poll(&mut self) -> Result<(), TransitionError> {
        self.expect(&[TaskStatus::Launched, TaskStatus::Polling], TaskStatus::Polling)?;
        self.status = TaskStatus::Polling;
        self.polls += 1;
        Ok(())
    }

    /// Moves to a terminal status. A terminal record never changes again.
    pub fn finish(
        &mut self,
        status: TaskStatus,
        error: Option<String>,
    ) -> Result<(), TransitionError> {
        if !status.is_terminal() {
            return Err(TransitionError::NotTerminal(status));
        }
        if self.status.is_terminal() {
            return Err(TransitionError::Invalid {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        if error.is_some() {
            self.last_error = error;
        }
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn expect(&self, allowed: &[TaskStatus], to: TaskStatus) -> Result<(), TransitionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(TransitionError::Invalid {
                from: self.status,
                to,
            })
        }
    }
}

impl Default for TaskRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arn(s: &str) -> TaskReference {
        TaskReference::new(s)
    }

    #[test]
    fn happy_path_counts_attempts_and_polls() {
        let mut rec = TaskRecord::new();
        rec.begin_launch().unwrap();
        rec.begin_launch().unwrap();
        rec.mark_launched(arn("arn:task/1")).unwrap();
        rec.begin_poll().unwrap();
        rec.begin_poll().unwrap();
        rec.finish(TaskStatus::Succeeded, None).unwrap();

        assert_eq!(rec.launch_attempts, 2);
        assert_eq!(rec.polls, 2);
        assert_eq!(rec.reference, Some(arn("arn:task/1")));
        assert!(rec.is_terminal());
    }

    #[test]
    fn reference_is_set_at_most_once() {
        let mut rec = TaskRecord::new();
        rec.begin_launch().unwrap();
        rec.mark_launched(arn("first")).unwrap();

        let err = rec.mark_launched(arn("second")).unwrap_err();
        assert_eq!(err, TransitionError::ReferenceAlreadySet(arn("first")));
        assert_eq!(rec.reference, Some(arn("first")));
    }

    #[test]
    fn cannot_launch_without_submitting() {
        let mut rec = TaskRecord::new();
        assert!(rec.mark_launched(arn("x")).is_err());
        assert!(rec.reference.is_none());
    }

    #[test]
    fn polling_requires_a_launched_task() {
        let mut rec = TaskRecord::new();
        rec.begin_launch().unwrap();
        assert!(matches!(
            rec.begin_poll(),
            Err(TransitionError::Invalid { from: TaskStatus::Launching, .. })
        ));
    }

    #[test]
    fn terminal_record_is_frozen() {
        let mut rec = TaskRecord::new();
        rec.begin_launch().unwrap();
        rec.finish(TaskStatus::Failed, Some("boom".into())).unwrap();

        assert!(rec.finish(TaskStatus::Succeeded, None).is_err());
        assert!(rec.begin_launch().is_err());
        assert_eq!(rec.status, TaskStatus::Failed);
        assert_eq!(rec.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn finish_rejects_non_terminal_status() {
        let mut rec = TaskRecord::new();
        assert_eq!(
            rec.finish(TaskStatus::Polling, None),
            Err(TransitionError::NotTerminal(TaskStatus::Polling))
        );
    }
}
