use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use ecsl_model::{TaskId, TaskRecord, TaskReport, TaskStatus};

/// Live view of every lifecycle in a batch.
///
/// Lifecycles publish a copy of their record after each transition; readers only ever get clones.
#[derive(Clone, Default)]
pub struct TaskBoard {
    inner: Arc<RwLock<BoardInner>>,
}

#[derive(Default)]
struct BoardInner {
    /// Reports in batch order.
    reports: Vec<TaskReport>,
    /// Index: task id -> position in `reports`.
    by_id: HashMap<TaskId, usize>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request in `NotLaunched` state.
    pub fn register(&self, id: TaskId, index: usize, label: String) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let slot = inner.reports.len();
        inner.reports.push(TaskReport {
            id: id.clone(),
            index,
            label,
            record: TaskRecord::new(),
        });
        inner.by_id.insert(id, slot);
    }

    /// Replaces the stored record of `id`. Unknown ids are ignored.
    pub fn publish(&self, id: &TaskId, record: &TaskRecord) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(&slot) = inner.by_id.get(id) {
            inner.reports[slot].record = record.clone();
        }
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskReport> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_id.get(id).map(|&slot| inner.reports[slot].clone())
    }

    /// All reports ordered by batch index.
    pub fn list_all(&self) -> Vec<TaskReport> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut reports = inner.reports.clone();
        reports.sort_by_key(|r| r.index);
        reports
    }

    pub fn list_by_status(&self, status: TaskStatus) -> Vec<TaskReport> {
        self.list_all()
            .into_iter()
            .filter(|r| r.record.status == status)
            .collect()
    }

    pub fn count_terminal(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .reports
            .iter()
            .filter(|r| r.record.is_terminal())
            .count()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
