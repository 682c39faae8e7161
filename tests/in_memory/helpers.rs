//! Shared test helpers for in-memory board synchronization tests.

use chrono::{TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;
use trellis::board::{
    adapters::memory::{BoardHub, HubTransport, ManualClock, SequentialIdGenerator},
    domain::{ActorId, Board},
    ports::{BoardTransport, IdGenerator},
    services::{BoardSession, SyncConfig},
};

/// Session type wired to the in-process hub.
pub type HubSession = BoardSession<HubTransport, ManualClock, SequentialIdGenerator>;

/// How long a helper waits for a board to converge.
pub const CONVERGENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Provides a fresh hub for each test.
#[fixture]
pub fn hub() -> BoardHub {
    BoardHub::new()
}

/// Provides a clock frozen at a fixed instant.
#[fixture]
pub fn clock() -> ManualClock {
    let start = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    ManualClock::new(start)
}

/// Creates a session for `config` attached to `hub`.
///
/// # Panics
///
/// Panics if the configuration is invalid.
pub fn session_with(hub: &BoardHub, clock: &ManualClock, config: SyncConfig) -> HubSession {
    let ids = SequentialIdGenerator::namespaced(config.actor.as_str());
    BoardSession::new(
        config,
        Arc::new(hub.transport()),
        Arc::new(clock.clone()),
        Arc::new(ids),
    )
    .expect("valid session config")
}

/// Creates a session for `actor` with default settings and connects it.
///
/// # Panics
///
/// Panics if the actor id is blank or the hub refuses the connection.
pub async fn connected(hub: &BoardHub, clock: &ManualClock, actor: &str) -> HubSession {
    let config = SyncConfig::for_actor(ActorId::new(actor).expect("valid actor"));
    let session = session_with(hub, clock, config);
    session.connect().await.expect("hub accepts the connection");
    session
}

/// Waits until `session`'s board satisfies `predicate`.
///
/// # Panics
///
/// Panics if the board does not get there within [`CONVERGENCE_TIMEOUT`].
pub async fn wait_until<T, C, G>(
    session: &BoardSession<T, C, G>,
    predicate: impl Fn(&Board) -> bool,
) -> Arc<Board>
where
    T: BoardTransport + 'static,
    C: Clock + Send + Sync + 'static,
    G: IdGenerator,
{
    let mut updates = session.subscribe();
    let seen = tokio::time::timeout(CONVERGENCE_TIMEOUT, updates.wait_for(|board| predicate(board)))
        .await
        .expect("board should converge before the timeout")
        .expect("session should still be running");
    Arc::clone(&seen)
}

/// Returns column titles in display order.
#[must_use]
pub fn column_titles(board: &Board) -> Vec<String> {
    board
        .ordered_columns()
        .map(|(column, _)| column.title().to_owned())
        .collect()
}
