//! Transport port connecting a board session to its peers.

use crate::board::domain::{ActorId, EventEnvelope};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Bidirectional link to the peers sharing a board.
///
/// Outbound traffic goes through [`BoardTransport::send`]. Inbound traffic
/// is pushed into the [`InboundSink`] handed over at connect time; the sink
/// never blocks, so adapters may call it from any task or thread.
#[async_trait]
pub trait BoardTransport: Send + Sync {
    /// Establishes the link for `actor`.
    ///
    /// Returns the join acknowledgement, which may carry the authoritative
    /// number of participants.
    async fn connect(&self, actor: &ActorId, inbound: InboundSink) -> TransportResult<JoinAck>;

    /// Tears the link down. Disconnecting an idle transport is a no-op.
    async fn disconnect(&self) -> TransportResult<()>;

    /// Queues an event for delivery to peers without waiting for it to be
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotConnected`] when no link is established,
    /// or another [`TransportError`] when the event cannot be queued.
    fn send(&self, envelope: &EventEnvelope) -> TransportResult<()>;
}

/// Acknowledgement returned by a successful connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinAck {
    active_users: Option<u32>,
}

impl JoinAck {
    /// Acknowledgement without presence information.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { active_users: None }
    }

    /// Acknowledgement carrying the authoritative participant count.
    #[must_use]
    pub const fn with_active_users(active_users: u32) -> Self {
        Self {
            active_users: Some(active_users),
        }
    }

    /// Returns the reported participant count, if any.
    #[must_use]
    pub const fn active_users(&self) -> Option<u32> {
        self.active_users
    }
}

/// Message pushed by a transport into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// A peer's board event.
    Event(EventEnvelope),
    /// The authoritative participant count changed.
    Presence(u32),
    /// The link dropped without a local disconnect request.
    ConnectionLost(String),
}

type Deliver = dyn Fn(InboundMessage) -> bool + Send + Sync;

/// Non-blocking hand-off from a transport into the session's apply queue.
#[derive(Clone)]
pub struct InboundSink {
    deliver: Arc<Deliver>,
}

impl InboundSink {
    /// Creates a sink from a delivery function returning `false` once the
    /// receiving session has shut down.
    #[must_use]
    pub fn new(deliver: impl Fn(InboundMessage) -> bool + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Hands a peer event to the session.
    #[must_use = "false means the session has shut down"]
    pub fn deliver(&self, envelope: EventEnvelope) -> bool {
        (self.deliver)(InboundMessage::Event(envelope))
    }

    /// Reports a new authoritative participant count.
    #[must_use = "false means the session has shut down"]
    pub fn update_presence(&self, active_users: u32) -> bool {
        (self.deliver)(InboundMessage::Presence(active_users))
    }

    /// Reports that the link dropped. A shut-down session ignores it.
    pub fn connection_lost(&self, reason: impl Into<String>) {
        (self.deliver)(InboundMessage::ConnectionLost(reason.into()));
    }
}

impl fmt::Debug for InboundSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundSink").finish_non_exhaustive()
    }
}

/// Errors returned by transport adapters. Each one is a connection error
/// from the caller's point of view.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The remote endpoint could not be reached.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// No link is currently established.
    #[error("transport is not connected")]
    NotConnected,

    /// A frame could not be encoded or decoded.
    #[error("wire codec error: {0}")]
    Codec(String),

    /// Underlying I/O failure.
    #[error("transport I/O error: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wraps an I/O error.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}
