use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TaskEnv;

/// Environment override applied to one named container at launch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOverride {
    pub name: String,
    #[serde(default, skip_serializing_if = "TaskEnv::is_empty")]
    pub env: TaskEnv,
}

impl ContainerOverride {
    pub fn new(name: impl Into<String>, env: TaskEnv) -> Self {
        Self {
            name: name.into(),
            env,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("cluster is empty")]
    EmptyCluster,
    #[error("task definition is empty")]
    EmptyTaskDefinition,
    #[error("count must be at least 1")]
    ZeroCount,
}

/// One task to launch.
///
/// Built by the caller and only ever read by the launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// Target cluster name or ARN.
    pub cluster: String,
    /// Task definition family, `family:revision` or ARN.
    pub task_definition: String,
    /// Number of instances to place. Zero is rejected by [`LaunchRequest::validate`].
    pub count: u32,
    /// Per-container environment overrides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ContainerOverride>,
}

impl LaunchRequest {
    pub fn new(cluster: impl Into<String>, task_definition: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            task_definition: task_definition.into(),
            count: 1,
            overrides: Vec::new(),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_override(mut self, container: impl Into<String>, env: TaskEnv) -> Self {
        self.overrides.push(ContainerOverride::new(container, env));
        self
    }

    /// Checked by the launcher before the first submission.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.cluster.trim().is_empty() {
            return Err(RequestError::EmptyCluster);
        }
        if self.task_definition.trim().is_empty() {
            return Err(RequestError::EmptyTaskDefinition);
        }
        if self.count == 0 {
            return Err(RequestError::ZeroCount);
        }
        Ok(())
    }

    /// Environment-override summary used to tell concurrent tasks apart in logs.
    ///
    /// Containers are joined in order with `,`; a request without overrides has an empty label.
    pub fn label(&self) -> String {
        self.overrides
            .iter()
            .filter(|o| !o.env.is_empty())
            .map(|o| o.env.summary())
            .collect::<Vec<_>>()
            .join(",")
    }
}
