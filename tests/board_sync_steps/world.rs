//! Shared world state for board synchronization BDD scenarios.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use rstest::fixture;
use trellis::board::{
    adapters::memory::{BoardHub, HubTransport, ManualClock, SequentialIdGenerator},
    domain::{ActorId, Board, ColumnId, TaskId},
    services::{BoardSession, SyncConfig, SyncError},
};

/// Session type used by the BDD world.
pub type HubSession = BoardSession<HubTransport, ManualClock, SequentialIdGenerator>;

/// One simulated participant.
pub struct Participant {
    pub session: HubSession,
    pub link: Arc<HubTransport>,
}

/// Scenario world for board synchronization behaviour tests.
pub struct BoardSyncWorld {
    pub hub: BoardHub,
    pub clock: ManualClock,
    pub participants: BTreeMap<String, Participant>,
    pub tasks: BTreeMap<String, TaskId>,
    pub last_result: Option<Result<(), SyncError>>,
}

impl BoardSyncWorld {
    /// Creates a world with an empty hub and a frozen clock.
    #[must_use]
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            hub: BoardHub::new(),
            clock: ManualClock::new(start),
            participants: BTreeMap::new(),
            tasks: BTreeMap::new(),
            last_result: None,
        }
    }

    /// Adds a participant attached to the hub but not yet connected.
    pub fn add_participant(&mut self, name: &str) -> Result<(), eyre::Report> {
        let actor = ActorId::new(name)?;
        let link = Arc::new(self.hub.transport());
        let session = BoardSession::new(
            SyncConfig::for_actor(actor),
            Arc::clone(&link),
            Arc::new(self.clock.clone()),
            Arc::new(SequentialIdGenerator::namespaced(name)),
        )?;
        self.participants
            .insert(name.to_owned(), Participant { session, link });
        Ok(())
    }

    /// Looks up a participant by name.
    pub fn participant(&self, name: &str) -> Result<&Participant, eyre::Report> {
        self.participants
            .get(name)
            .ok_or_else(|| eyre::eyre!("unknown participant {name}"))
    }

    /// Looks up a task created in this scenario by title.
    pub fn task_id(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(title)
            .cloned()
            .ok_or_else(|| eyre::eyre!("no task titled {title} was created"))
    }
}

impl Default for BoardSyncWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardSyncWorld {
    BoardSyncWorld::default()
}

/// Parses a column id from a step argument.
pub fn column_id(raw: &str) -> Result<ColumnId, eyre::Report> {
    Ok(ColumnId::new(raw)?)
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Waits until `participant`'s board satisfies `predicate`.
pub fn wait_for_board(
    participant: &Participant,
    predicate: impl Fn(&Board) -> bool,
) -> Result<Arc<Board>, eyre::Report> {
    let mut updates = participant.session.subscribe();
    run_async(async {
        let seen = tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|board| predicate(board)),
        )
        .await
        .map_err(|_| eyre::eyre!("board did not reach the expected state in time"))??;
        Ok::<_, eyre::Report>(Arc::clone(&seen))
    })
}
