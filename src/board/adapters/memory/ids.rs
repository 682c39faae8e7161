//! Deterministic identifier generator.

use crate::board::{
    domain::{ColumnId, TaskId},
    ports::IdGenerator,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Allocates `task-<namespace>-<n>` and `column-<namespace>-<n>` ids from
/// per-kind counters starting at 1.
///
/// Give each simulated peer its own namespace so their ids cannot collide.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    namespace: String,
    next_task: AtomicU64,
    next_column: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator in the `seq` namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::namespaced("seq")
    }

    /// Creates a generator in `namespace`.
    #[must_use]
    pub fn namespaced(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next_task: AtomicU64::new(1),
            next_column: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_task_id(&self) -> TaskId {
        let n = self.next_task.fetch_add(1, Ordering::Relaxed);
        TaskId::prefixed("task", format_args!("{}-{n}", self.namespace))
    }

    fn next_column_id(&self) -> ColumnId {
        let n = self.next_column.fetch_add(1, Ordering::Relaxed);
        ColumnId::prefixed("column", format_args!("{}-{n}", self.namespace))
    }
}
