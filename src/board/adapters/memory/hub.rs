//! In-process relay connecting several board sessions.
//!
//! [`BoardHub`] plays the role of the relay server: it forwards each event
//! to every other connected peer and pushes the authoritative participant
//! count whenever a peer joins or leaves. [`HubTransport`] is the per-session
//! [`BoardTransport`] backed by a hub.

use crate::board::{
    domain::{ActorId, EventEnvelope},
    ports::{BoardTransport, InboundSink, JoinAck, TransportError, TransportResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Shared in-process relay.
#[derive(Debug, Clone, Default)]
pub struct BoardHub {
    state: Arc<Mutex<HubState>>,
}

#[derive(Debug, Default)]
struct HubState {
    peers: BTreeMap<u64, HubPeer>,
    next_peer_id: u64,
}

#[derive(Debug)]
struct HubPeer {
    actor: ActorId,
    sink: InboundSink,
}

impl HubState {
    fn presence(&self) -> u32 {
        u32::try_from(self.peers.len()).unwrap_or(u32::MAX)
    }

    fn broadcast_presence(&self) {
        self.notify_presence(None);
    }

    fn notify_presence(&self, except: Option<u64>) {
        let count = self.presence();
        for (peer_id, peer) in &self.peers {
            if Some(*peer_id) != except && !peer.sink.update_presence(count) {
                debug!(target: "trellis::transport", peer_id, "presence not delivered; session closed");
            }
        }
    }
}

impl BoardHub {
    /// Creates a hub with no peers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport attached to this hub.
    #[must_use]
    pub fn transport(&self) -> HubTransport {
        HubTransport::new(self.clone())
    }

    /// Returns the number of connected peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.lock().peers.len()
    }

    /// Drops every link held by `actor` as if the network failed, notifying
    /// the affected sessions. Returns whether any peer was removed.
    pub fn sever(&self, actor: &ActorId) -> bool {
        let mut state = self.lock();
        let severed: Vec<u64> = state
            .peers
            .iter()
            .filter(|(_, peer)| peer.actor == *actor)
            .map(|(peer_id, _)| *peer_id)
            .collect();
        for peer_id in &severed {
            if let Some(peer) = state.peers.remove(peer_id) {
                peer.sink.connection_lost("link severed by hub");
            }
        }
        if !severed.is_empty() {
            state.broadcast_presence();
        }
        !severed.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join(&self, actor: &ActorId, sink: InboundSink) -> (u64, u32) {
        let mut state = self.lock();
        let peer_id = state.next_peer_id;
        state.next_peer_id += 1;
        state.peers.insert(
            peer_id,
            HubPeer {
                actor: actor.clone(),
                sink,
            },
        );
        state.notify_presence(Some(peer_id));
        (peer_id, state.presence())
    }

    fn leave(&self, peer_id: u64) {
        let mut state = self.lock();
        if state.peers.remove(&peer_id).is_some() {
            state.broadcast_presence();
        }
    }

    fn publish(&self, from: u64, envelope: &EventEnvelope) -> TransportResult<()> {
        let state = self.lock();
        if !state.peers.contains_key(&from) {
            return Err(TransportError::NotConnected);
        }
        for (peer_id, peer) in &state.peers {
            if *peer_id != from && !peer.sink.deliver(envelope.clone()) {
                debug!(target: "trellis::transport", peer_id, "event not delivered; session closed");
            }
        }
        Ok(())
    }
}

/// [`BoardTransport`] backed by a [`BoardHub`].
///
/// Availability can be toggled to simulate outages, and every event
/// accepted by [`BoardTransport::send`] is recorded.
#[derive(Debug)]
pub struct HubTransport {
    hub: BoardHub,
    peer_id: Mutex<Option<u64>>,
    available: AtomicBool,
    sent: Mutex<Vec<EventEnvelope>>,
}

impl HubTransport {
    /// Creates a disconnected transport for `hub`.
    #[must_use]
    pub fn new(hub: BoardHub) -> Self {
        Self {
            hub,
            peer_id: Mutex::new(None),
            available: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Makes the hub reachable or unreachable for this transport.
    ///
    /// While unreachable, `connect` and `send` fail with
    /// [`TransportError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns every event accepted for delivery, in send order.
    #[must_use]
    pub fn sent(&self) -> Vec<EventEnvelope> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn peer_slot(&self) -> MutexGuard<'_, Option<u64>> {
        self.peer_id.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for HubTransport {
    fn drop(&mut self) {
        let slot = self.peer_id.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(peer_id) = slot.take() {
            debug!(target: "trellis::transport", peer_id, "transport dropped while joined; leaving hub");
            self.hub.leave(peer_id);
        }
    }
}

#[async_trait]
impl BoardTransport for HubTransport {
    async fn connect(&self, actor: &ActorId, inbound: InboundSink) -> TransportResult<JoinAck> {
        if !self.is_available() {
            return Err(TransportError::Unavailable("hub unreachable".to_owned()));
        }
        let mut slot = self.peer_slot();
        if let Some(previous) = slot.take() {
            self.hub.leave(previous);
        }
        let (peer_id, active_users) = self.hub.join(actor, inbound);
        *slot = Some(peer_id);
        Ok(JoinAck::with_active_users(active_users))
    }

    async fn disconnect(&self) -> TransportResult<()> {
        if let Some(peer_id) = self.peer_slot().take() {
            self.hub.leave(peer_id);
        }
        Ok(())
    }

    fn send(&self, envelope: &EventEnvelope) -> TransportResult<()> {
        if !self.is_available() {
            return Err(TransportError::Unavailable("hub unreachable".to_owned()));
        }
        let peer_id = (*self.peer_slot()).ok_or(TransportError::NotConnected)?;
        // Held across the publish so `sent` never lags behind delivery.
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        self.hub.publish(peer_id, envelope)?;
        sent.push(envelope.clone());
        Ok(())
    }
}
