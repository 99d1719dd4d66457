//! Response shapes of the remote task API.
//!
//! A launch response has no single success flag: callers must look at the failure list and the
//! accepted list separately.

use serde::{Deserialize, Serialize};

use crate::TaskReference;

/// `lastStatus` value of a task that will not transition again.
pub const STOPPED: &str = "STOPPED";

/// Per-task rejection reported inside an otherwise successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            arn: None,
            reason: reason.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A task the remote API accepted for placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub reference: TaskReference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchResponse {
    #[serde(default)]
    pub accepted: Vec<TaskHandle>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

impl LaunchResponse {
    pub fn accepted(reference: impl Into<String>) -> Self {
        Self {
            accepted: vec![TaskHandle {
                reference: TaskReference::new(reference),
            }],
            failures: Vec::new(),
        }
    }

    pub fn rejected(failures: Vec<Failure>) -> Self {
        Self {
            accepted: Vec::new(),
            failures,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    #[serde(default)]
    pub name: String,
    /// Absent while the container is still running or never started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ContainerState {
    pub fn exited(name: impl Into<String>, code: i32) -> Self {
        Self {
            name: name.into(),
            exit_code: Some(code),
            reason: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTask {
    pub reference: TaskReference,
    pub last_status: String,
    #[serde(default)]
    pub containers: Vec<ContainerState>,
}

impl RemoteTask {
    pub fn new(reference: TaskReference, last_status: impl Into<String>) -> Self {
        Self {
            reference,
            last_status: last_status.into(),
            containers: Vec::new(),
        }
    }

    pub fn with_container(mut self, container: ContainerState) -> Self {
        self.containers.push(container);
        self
    }

    pub fn is_stopped(&self) -> bool {
        self.last_status == STOPPED
    }

    /// Containers that exited with a code greater than zero.
    pub fn failed_containers(&self) -> impl Iterator<Item = &ContainerState> {
        self.containers
            .iter()
            .filter(|c| c.exit_code.is_some_and(|code| code > 0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeResponse {
    #[serde(default)]
    pub tasks: Vec<RemoteTask>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

impl DescribeResponse {
    pub fn task(task: RemoteTask) -> Self {
        Self {
            tasks: vec![task],
            failures: Vec::new(),
        }
    }
}
