//! Local mutation intents.

use super::{ColumnId, TaskId};

/// A mutation requested by the local user, with any new identifier already
/// allocated by the caller.
///
/// [`super::engine::execute`] resolves a command into a [`super::BoardEvent`]
/// (stamping timestamps) and applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardCommand {
    /// Append a new task to a column.
    CreateTask {
        /// Target column.
        column_id: ColumnId,
        /// Freshly allocated task id.
        task_id: TaskId,
        /// Task title.
        title: String,
        /// Optional description.
        description: Option<String>,
    },
    /// Replace a task's title and description.
    UpdateTask {
        /// Target task.
        task_id: TaskId,
        /// New title.
        title: String,
        /// New description.
        description: Option<String>,
    },
    /// Delete a task owned by a column.
    DeleteTask {
        /// Target task.
        task_id: TaskId,
        /// Owning column.
        column_id: ColumnId,
    },
    /// Append a new empty column.
    CreateColumn {
        /// Freshly allocated column id.
        column_id: ColumnId,
        /// Column title.
        title: String,
    },
    /// Rename a column.
    UpdateColumn {
        /// Target column.
        column_id: ColumnId,
        /// New title.
        title: String,
    },
    /// Delete a column and its tasks.
    DeleteColumn {
        /// Target column.
        column_id: ColumnId,
    },
    /// Move a task within or between columns.
    MoveTask {
        /// Moved task.
        task_id: TaskId,
        /// Current owner.
        source_column_id: ColumnId,
        /// New owner.
        destination_column_id: ColumnId,
        /// Insertion index, clamped to the destination length.
        new_index: usize,
    },
    /// Move a column within the column order.
    MoveColumn {
        /// Moved column.
        column_id: ColumnId,
        /// Insertion index, clamped to the order length.
        new_index: usize,
    },
}
