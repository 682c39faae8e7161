//! Column entity.

use super::{ColumnId, TaskId};
use serde::{Deserialize, Serialize};

/// A named, ordered bucket of task ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    id: ColumnId,
    title: String,
    #[serde(default)]
    task_ids: Vec<TaskId>,
}

impl Column {
    /// Creates an empty column.
    #[must_use]
    pub fn new(id: ColumnId, title: &str) -> Self {
        Self {
            id,
            title: title.trim().to_owned(),
            task_ids: Vec::new(),
        }
    }

    /// Returns the column identifier.
    #[must_use]
    pub const fn id(&self) -> &ColumnId {
        &self.id
    }

    /// Returns the column title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the ordered task ids owned by this column.
    #[must_use]
    pub fn task_ids(&self) -> &[TaskId] {
        &self.task_ids
    }

    /// Returns the position of `task_id`, if present.
    #[must_use]
    pub fn position_of(&self, task_id: &TaskId) -> Option<usize> {
        self.task_ids.iter().position(|id| id == task_id)
    }

    /// Returns whether the column lists `task_id`.
    #[must_use]
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.task_ids.contains(task_id)
    }

    pub(super) fn rename(&mut self, title: &str) {
        title.trim().clone_into(&mut self.title);
    }

    pub(super) fn push_task(&mut self, task_id: TaskId) {
        self.task_ids.push(task_id);
    }

    /// Removes `task_id`, preserving the order of the remaining ids.
    pub(super) fn remove_task(&mut self, task_id: &TaskId) -> Option<usize> {
        let index = self.position_of(task_id)?;
        self.task_ids.remove(index);
        Some(index)
    }

    /// Inserts `task_id` at `index`, clamped to the end of the list.
    pub(super) fn insert_task(&mut self, index: usize, task_id: TaskId) {
        let clamped = index.min(self.task_ids.len());
        self.task_ids.insert(clamped, task_id);
    }

    pub(super) fn take_task_ids(&mut self) -> Vec<TaskId> {
        std::mem::take(&mut self.task_ids)
    }
}
