//! Board events exchanged between peers.
//!
//! There is one event per mutation, and the event carries that mutation's
//! resolved arguments (generated ids and creation timestamps included).
//! Applying an event is the only way a board changes, whether the event
//! originated locally or arrived from a peer.

use super::{ActorId, Column, ColumnId, Task, TaskId};
use serde::{Deserialize, Serialize};

/// A board mutation in wire form.
///
/// Serializes as `{"event": "<name>", "payload": {...}}` with camelCase
/// payload field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum BoardEvent {
    /// A task was appended to a column.
    CreateTask {
        /// Owning column.
        column_id: ColumnId,
        /// The new task, including its generated id and timestamps.
        task: Task,
    },
    /// A task's title and description were replaced.
    UpdateTask {
        /// Target task.
        task_id: TaskId,
        /// New title.
        title: String,
        /// New description; `None` clears it.
        #[serde(default)]
        description: Option<String>,
    },
    /// A task was removed from its column and the board.
    DeleteTask {
        /// Removed task.
        task_id: TaskId,
        /// Column that owned the task.
        column_id: ColumnId,
    },
    /// An empty column was appended to the column order.
    CreateColumn {
        /// The new column.
        column: Column,
    },
    /// A column was renamed.
    UpdateColumn {
        /// Target column.
        column_id: ColumnId,
        /// New title.
        title: String,
    },
    /// A column and every task it owned were removed.
    DeleteColumn {
        /// Removed column.
        column_id: ColumnId,
    },
    /// A task was moved within or between columns.
    MoveTask {
        /// Moved task.
        task_id: TaskId,
        /// Column the task is taken from.
        source_column_id: ColumnId,
        /// Column the task is inserted into.
        destination_column_id: ColumnId,
        /// Insertion index, relative to the destination list after removal.
        new_index: usize,
    },
    /// A column was moved within the column order.
    MoveColumn {
        /// Moved column.
        column_id: ColumnId,
        /// Insertion index, relative to the order after removal.
        new_index: usize,
    },
}

impl BoardEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateTask { .. } => "createTask",
            Self::UpdateTask { .. } => "updateTask",
            Self::DeleteTask { .. } => "deleteTask",
            Self::CreateColumn { .. } => "createColumn",
            Self::UpdateColumn { .. } => "updateColumn",
            Self::DeleteColumn { .. } => "deleteColumn",
            Self::MoveTask { .. } => "moveTask",
            Self::MoveColumn { .. } => "moveColumn",
        }
    }
}

/// A board event tagged with the actor that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    origin: ActorId,
    event: BoardEvent,
}

impl EventEnvelope {
    /// Wraps an event produced by `origin`.
    #[must_use]
    pub const fn new(origin: ActorId, event: BoardEvent) -> Self {
        Self { origin, event }
    }

    /// Returns the producing actor.
    #[must_use]
    pub const fn origin(&self) -> &ActorId {
        &self.origin
    }

    /// Returns the wrapped event.
    #[must_use]
    pub const fn event(&self) -> &BoardEvent {
        &self.event
    }

    /// Splits the envelope into origin and event.
    #[must_use]
    pub fn into_parts(self) -> (ActorId, BoardEvent) {
        (self.origin, self.event)
    }
}
