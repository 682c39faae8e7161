//! Error types for board mutations and invariant checks.

use super::{ColumnId, TaskId};
use thiserror::Error;

/// Coarse classification of a mutation failure, as surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced task or column does not exist, or a membership check
    /// failed.
    NotFound,
    /// An argument was rejected before any state was touched.
    InvalidArgument,
}

/// Errors returned by the mutation engine and domain constructors.
///
/// A failed mutation never produces a new board: the input snapshot stays
/// the current one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The task does not exist on the board.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The column does not exist on the board.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),

    /// The task exists but is not listed by the given column.
    #[error("task {task_id} is not a member of column {column_id}")]
    TaskNotInColumn {
        /// Task identifier.
        task_id: TaskId,
        /// Column that was expected to own the task.
        column_id: ColumnId,
    },

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// The column title is empty after trimming.
    #[error("column title must not be empty")]
    EmptyColumnTitle,

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// A column with the same identifier already exists.
    #[error("duplicate column identifier: {0}")]
    DuplicateColumn(ColumnId),

    /// An identifier was empty after trimming.
    #[error("invalid {kind} identifier '{value}'")]
    InvalidIdentifier {
        /// Identifier family (`task`, `column`, `actor`).
        kind: &'static str,
        /// Rejected raw value.
        value: String,
    },
}

impl BoardDomainError {
    /// Returns the caller-facing classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_) | Self::ColumnNotFound(_) | Self::TaskNotInColumn { .. } => {
                ErrorKind::NotFound
            }
            Self::EmptyTaskTitle
            | Self::EmptyColumnTitle
            | Self::DuplicateTask(_)
            | Self::DuplicateColumn(_)
            | Self::InvalidIdentifier { .. } => ErrorKind::InvalidArgument,
        }
    }
}

/// A structural invariant violated by a board snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardInvariantError {
    /// A column id appears more than once in the column order.
    #[error("column {0} appears more than once in the column order")]
    DuplicateColumnInOrder(ColumnId),

    /// The column order references a column that does not exist.
    #[error("column order references unknown column {0}")]
    UnknownColumnInOrder(ColumnId),

    /// A column exists but is missing from the column order.
    #[error("column {0} is missing from the column order")]
    ColumnMissingFromOrder(ColumnId),

    /// A column lists a task that does not exist.
    #[error("column {column_id} references unknown task {task_id}")]
    UnknownTaskInColumn {
        /// Referencing column.
        column_id: ColumnId,
        /// Missing task.
        task_id: TaskId,
    },

    /// A task id is listed more than once across all columns.
    #[error("task {0} is listed more than once across columns")]
    TaskListedTwice(TaskId),

    /// A task exists but no column lists it.
    #[error("task {0} is not owned by any column")]
    OrphanTask(TaskId),

    /// An activity entry refers to a task that no longer exists.
    #[error("activity recorded for unknown task {0}")]
    StaleActivity(TaskId),
}

/// Error returned while parsing an activity kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown activity kind: {0}")]
pub struct ParseActivityKindError(pub String);
