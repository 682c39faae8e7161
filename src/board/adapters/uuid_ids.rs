//! Random identifier generator.

use crate::board::{
    domain::{ColumnId, TaskId},
    ports::IdGenerator,
};
use uuid::Uuid;

/// Allocates `task-<uuid>` and `column-<uuid>` identifiers from random
/// version 4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl UuidIdGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl IdGenerator for UuidIdGenerator {
    fn next_task_id(&self) -> TaskId {
        TaskId::prefixed("task", Uuid::new_v4())
    }

    fn next_column_id(&self) -> ColumnId {
        ColumnId::prefixed("column", Uuid::new_v4())
    }
}
