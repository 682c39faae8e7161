//! Identifier allocation port.

use crate::board::domain::{ColumnId, TaskId};

/// Allocates fresh, globally unique identifiers for new tasks and columns.
///
/// Injected so tests and replays can produce deterministic ids.
pub trait IdGenerator: Send + Sync {
    /// Returns a task id that has never been returned before.
    fn next_task_id(&self) -> TaskId;

    /// Returns a column id that has never been returned before.
    fn next_column_id(&self) -> ColumnId;
}
