use serde::{Deserialize, Serialize};

use crate::{TaskId, TaskRecord};

/// What the launcher reports for one request of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub id: TaskId,
    /// Position of the request in the submitted batch.
    pub index: usize,
    /// Environment-override summary of the request.
    pub label: String,
    pub record: TaskRecord,
}
