//! Connection state machine shared by the session and its apply loop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Connection state of a board session.
///
/// Transitions: `Disconnected -> Connecting -> Connected -> Disconnected`,
/// plus `Connecting -> Disconnected` when an attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No link; emitted events are queued.
    Disconnected,
    /// A connect attempt is pending or about to start.
    Connecting,
    /// Linked to peers.
    Connected,
}

impl ConnectionState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    /// Returns whether transition to `target` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected | Self::Disconnected)
                | (Self::Connected, Self::Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct LinkState {
    state: ConnectionState,
    generation: u64,
}

/// Shared view of the connection state.
///
/// `generation` increases with every connect attempt so that late reports
/// from a replaced link (such as a loss notification) can be told apart
/// from reports about the current one.
#[derive(Debug)]
pub(super) struct ConnectionLink {
    inner: Mutex<LinkState>,
}

impl ConnectionLink {
    /// Creates a link in the session-start state, `Connecting`.
    pub(super) const fn new() -> Self {
        Self {
            inner: Mutex::new(LinkState {
                state: ConnectionState::Connecting,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub(super) fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Starts a connect attempt and returns its generation, or `None` when
    /// already connected.
    pub(super) fn begin_attempt(&self) -> Option<u64> {
        let mut link = self.lock();
        if link.state == ConnectionState::Connected {
            return None;
        }
        transition(&mut link, ConnectionState::Connecting);
        link.generation += 1;
        Some(link.generation)
    }

    pub(super) fn finish_attempt(&self, generation: u64, outcome: ConnectionState) {
        let mut link = self.lock();
        if link.generation == generation {
            transition(&mut link, outcome);
        }
    }

    /// Moves to `Disconnected`. A non-`None` generation only applies when it
    /// matches the current one.
    ///
    /// Returns whether the session was connected before.
    pub(super) fn mark_disconnected(&self, generation: Option<u64>) -> bool {
        let mut link = self.lock();
        if generation.is_some_and(|expected| expected != link.generation) {
            return false;
        }
        let was_connected = link.state == ConnectionState::Connected;
        transition(&mut link, ConnectionState::Disconnected);
        was_connected
    }
}

fn transition(link: &mut LinkState, target: ConnectionState) {
    if link.state == target {
        return;
    }
    if link.state.can_transition_to(target) {
        info!(target: "trellis::sync", from = %link.state, to = %target, "connection state changed");
        link.state = target;
    } else {
        debug!(target: "trellis::sync", from = %link.state, to = %target, "ignoring invalid connection transition");
    }
}
