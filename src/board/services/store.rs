//! Entity store holding the current board snapshot.

use crate::board::domain::Board;
use std::sync::Arc;
use tokio::sync::watch;

/// Holds exactly one current [`Board`].
///
/// Snapshots are swapped whole, so a reader sees either the previous board
/// or the next one, never a partially applied mutation. Subscribers are
/// notified after every swap.
#[derive(Debug)]
pub struct BoardStore {
    snapshots: watch::Sender<Arc<Board>>,
}

impl BoardStore {
    /// Creates a store holding `board`.
    #[must_use]
    pub fn new(board: Board) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(board));
        Self { snapshots }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<Board> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Atomically replaces the current snapshot.
    pub fn replace(&self, next: Board) {
        self.snapshots.send_replace(Arc::new(next));
    }

    /// Subscribes to snapshot replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Board>> {
        self.snapshots.subscribe()
    }
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new(Board::seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::domain::{ActorId, ColumnId, MutationContext, engine};
    use chrono::Utc;

    #[tokio::test]
    async fn replace_notifies_subscribers_with_whole_snapshot() {
        let store = BoardStore::default();
        let mut updates = store.subscribe();
        let actor = ActorId::new("alice").expect("valid actor");
        let ctx = MutationContext::new(&actor, Utc::now());

        let mutation = engine::create_column(
            &store.current(),
            ColumnId::new("column-4").expect("valid column id"),
            "Blocked",
            &ctx,
        )
        .expect("column creation should succeed");
        let (next, _) = mutation.into_parts();
        store.replace(next);

        updates.changed().await.expect("store should still be alive");
        let seen = Arc::clone(&updates.borrow_and_update());
        assert_eq!(seen.column_order().len(), 4);
        assert!(seen.check_invariants().is_ok());
        assert_eq!(seen, store.current());
    }
}
