//! Board aggregate: tasks, columns, column order, presence and activity.

use super::{Activity, BoardInvariantError, Column, ColumnId, Task, TaskId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Identifiers and titles of the columns every new board starts with.
const SEED_COLUMNS: [(&str, &str); 3] = [
    ("column-1", "To Do"),
    ("column-2", "In Progress"),
    ("column-3", "Done"),
];

/// Full collaborative board state.
///
/// Boards are immutable snapshots from the outside: every change goes
/// through [`super::engine`], which returns a new board and leaves its input
/// untouched. Collections are ordered maps so that two boards built from the
/// same history compare equal and serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub(super) tasks: BTreeMap<TaskId, Task>,
    pub(super) columns: BTreeMap<ColumnId, Column>,
    pub(super) column_order: Vec<ColumnId>,
    pub(super) active_users: u32,
    pub(super) user_activity: BTreeMap<TaskId, Activity>,
}

impl Board {
    /// Creates a board with no columns and no tasks.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            tasks: BTreeMap::new(),
            columns: BTreeMap::new(),
            column_order: Vec::new(),
            active_users: 0,
            user_activity: BTreeMap::new(),
        }
    }

    /// Creates the session-start board: three empty columns, "To Do",
    /// "In Progress" and "Done".
    #[must_use]
    pub fn seed() -> Self {
        let mut board = Self::empty();
        let seeded = SEED_COLUMNS
            .iter()
            .filter_map(|(id, title)| ColumnId::new(*id).ok().map(|column_id| (column_id, *title)));
        for (column_id, title) in seeded {
            board.column_order.push(column_id.clone());
            board
                .columns
                .insert(column_id.clone(), Column::new(column_id, title));
        }
        board
    }

    /// Returns all tasks keyed by id.
    #[must_use]
    pub const fn tasks(&self) -> &BTreeMap<TaskId, Task> {
        &self.tasks
    }

    /// Returns all columns keyed by id.
    #[must_use]
    pub const fn columns(&self) -> &BTreeMap<ColumnId, Column> {
        &self.columns
    }

    /// Returns the display order of columns.
    #[must_use]
    pub fn column_order(&self) -> &[ColumnId] {
        &self.column_order
    }

    /// Returns the number of participants currently online.
    #[must_use]
    pub const fn active_users(&self) -> u32 {
        self.active_users
    }

    /// Returns the activity map keyed by task id.
    #[must_use]
    pub const fn user_activity(&self) -> &BTreeMap<TaskId, Activity> {
        &self.user_activity
    }

    /// Looks up a task.
    #[must_use]
    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    /// Looks up a column.
    #[must_use]
    pub fn column(&self, column_id: &ColumnId) -> Option<&Column> {
        self.columns.get(column_id)
    }

    /// Returns the most recent activity recorded for a task.
    #[must_use]
    pub fn activity_for(&self, task_id: &TaskId) -> Option<&Activity> {
        self.user_activity.get(task_id)
    }

    /// Returns the column that owns `task_id`, if any.
    #[must_use]
    pub fn column_of(&self, task_id: &TaskId) -> Option<&Column> {
        self.columns.values().find(|column| column.contains(task_id))
    }

    /// Returns columns in display order together with their tasks.
    pub fn ordered_columns(&self) -> impl Iterator<Item = (&Column, Vec<&Task>)> + '_ {
        self.column_order
            .iter()
            .filter_map(|column_id| self.columns.get(column_id))
            .map(|column| {
                let tasks = column
                    .task_ids()
                    .iter()
                    .filter_map(|task_id| self.tasks.get(task_id))
                    .collect();
                (column, tasks)
            })
    }

    /// Verifies the referential invariants of the board.
    ///
    /// - `column_order` is a permutation of the column keys.
    /// - Every listed task exists, and every task is listed exactly once.
    /// - Activity entries only exist for present tasks.
    ///
    /// # Errors
    ///
    /// Returns the first [`BoardInvariantError`] found.
    pub fn check_invariants(&self) -> Result<(), BoardInvariantError> {
        let mut ordered = BTreeSet::new();
        for column_id in &self.column_order {
            if !ordered.insert(column_id) {
                return Err(BoardInvariantError::DuplicateColumnInOrder(
                    column_id.clone(),
                ));
            }
            if !self.columns.contains_key(column_id) {
                return Err(BoardInvariantError::UnknownColumnInOrder(column_id.clone()));
            }
        }
        if let Some(missing) = self.columns.keys().find(|id| !ordered.contains(id)) {
            return Err(BoardInvariantError::ColumnMissingFromOrder(missing.clone()));
        }

        let mut listed = BTreeSet::new();
        for column in self.columns.values() {
            for task_id in column.task_ids() {
                if !self.tasks.contains_key(task_id) {
                    return Err(BoardInvariantError::UnknownTaskInColumn {
                        column_id: column.id().clone(),
                        task_id: task_id.clone(),
                    });
                }
                if !listed.insert(task_id) {
                    return Err(BoardInvariantError::TaskListedTwice(task_id.clone()));
                }
            }
        }
        if let Some(orphan) = self.tasks.keys().find(|id| !listed.contains(id)) {
            return Err(BoardInvariantError::OrphanTask(orphan.clone()));
        }

        if let Some(stale) = self
            .user_activity
            .keys()
            .find(|id| !self.tasks.contains_key(*id))
        {
            return Err(BoardInvariantError::StaleActivity(stale.clone()));
        }
        Ok(())
    }
}
