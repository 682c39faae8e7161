//! Relay server fanning board events out to every connected client.

use super::frame::{WireFrame, write_loop};
use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// TCP relay for the board line protocol.
///
/// The relay holds no board state: it forwards each event frame to every
/// other client and broadcasts the connected-client count on each join and
/// leave. Dropping the server stops it and closes every connection.
#[derive(Debug)]
pub struct RelayServer {
    local_addr: SocketAddr,
    state: Arc<RelayState>,
    accept_task: JoinHandle<()>,
}

#[derive(Debug)]
struct RelayState {
    peer_queue_capacity: usize,
    peers: Mutex<RelayPeers>,
}

#[derive(Debug, Default)]
struct RelayPeers {
    outbound: BTreeMap<u64, mpsc::Sender<String>>,
    next_peer_id: u64,
}

/// Frames queued per client before the relay treats it as stalled.
pub const DEFAULT_PEER_QUEUE_CAPACITY: usize = 1024;

impl RelayServer {
    /// Binds the relay to `address` (use port 0 for an ephemeral port) and
    /// starts accepting clients.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while binding.
    pub async fn bind(address: &str) -> io::Result<Self> {
        Self::bind_with_queue_capacity(address, DEFAULT_PEER_QUEUE_CAPACITY).await
    }

    /// Binds like [`RelayServer::bind`], holding at most
    /// `peer_queue_capacity` frames for each client. A client whose queue
    /// fills up is disconnected.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while binding.
    pub async fn bind_with_queue_capacity(
        address: &str,
        peer_queue_capacity: usize,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;
        let state = Arc::new(RelayState::new(peer_queue_capacity));
        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&state)));
        info!(target: "trellis::transport", %local_addr, "relay listening");
        Ok(Self {
            local_addr,
            state,
            accept_task,
        })
    }

    /// Returns the bound address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the number of joined clients.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.state.lock().outbound.len()
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.accept_task.abort();
        self.state.lock().outbound.clear();
    }
}

impl RelayState {
    fn new(peer_queue_capacity: usize) -> Self {
        Self {
            peer_queue_capacity: peer_queue_capacity.max(1),
            peers: Mutex::new(RelayPeers::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RelayPeers> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a client and broadcasts the new count. The joining client
    /// receives the count as its first frame.
    fn join(&self, outbound: mpsc::Sender<String>) -> u64 {
        let mut peers = self.lock();
        let peer_id = peers.next_peer_id;
        peers.next_peer_id += 1;
        peers.outbound.insert(peer_id, outbound);
        broadcast_presence(&mut peers);
        peer_id
    }

    fn leave(&self, peer_id: u64) {
        let mut peers = self.lock();
        if peers.outbound.remove(&peer_id).is_some() {
            broadcast_presence(&mut peers);
        }
    }

    fn forward(&self, from: u64, line: &str) {
        let mut peers = self.lock();
        fan_out(&mut peers, Some(from), line);
    }
}

/// Queues `line` for every peer except `skip`. Peers whose queue is full or
/// closed are evicted; dropping their sender lets the writer flush and close
/// the socket, and the remaining peers learn the new count.
fn fan_out(peers: &mut RelayPeers, skip: Option<u64>, line: &str) {
    let mut evicted = Vec::new();
    for (peer_id, outbound) in &peers.outbound {
        if Some(*peer_id) == skip {
            continue;
        }
        match outbound.try_send(line.to_owned()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(target: "trellis::transport", peer_id, "peer queue full; disconnecting stalled client");
                evicted.push(*peer_id);
            }
            Err(TrySendError::Closed(_)) => {
                debug!(target: "trellis::transport", peer_id, "peer queue closed");
                evicted.push(*peer_id);
            }
        }
    }
    if evicted.is_empty() {
        return;
    }
    for peer_id in &evicted {
        peers.outbound.remove(peer_id);
    }
    broadcast_presence(peers);
}

fn broadcast_presence(peers: &mut RelayPeers) {
    let active_users = u32::try_from(peers.outbound.len()).unwrap_or(u32::MAX);
    match (WireFrame::Presence { active_users }).encode() {
        Ok(line) => fan_out(peers, None, &line),
        Err(err) => {
            warn!(target: "trellis::transport", error = %err, "failed to encode presence");
        }
    }
}

async fn accept_loop(listener: TcpListener, state: Arc<RelayState>) {
    // Dropping the set (when this task is aborted) aborts every connection.
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    debug!(target: "trellis::transport", %peer_addr, "client connected");
                    connections.spawn(serve_client(stream, Arc::clone(&state)));
                }
                Err(err) => {
                    warn!(target: "trellis::transport", error = %err, "accept failed");
                }
            },
            Some(_) = connections.join_next() => {}
        }
    }
}

async fn serve_client(stream: TcpStream, state: Arc<RelayState>) {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let actor = match lines.next_line().await {
        Ok(Some(line)) => match WireFrame::decode(&line) {
            Ok(WireFrame::Hello { actor }) => actor,
            Ok(other) => {
                warn!(target: "trellis::transport", frame = ?other, "expected hello; dropping client");
                return;
            }
            Err(err) => {
                warn!(target: "trellis::transport", error = %err, "malformed hello; dropping client");
                return;
            }
        },
        Ok(None) | Err(_) => return,
    };

    let (outbound, queued) = mpsc::channel(state.peer_queue_capacity);
    let writer = tokio::spawn(write_loop(write_half, queued));
    let peer_id = state.join(outbound);
    info!(target: "trellis::transport", %actor, peer_id, "client joined");

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match WireFrame::decode(&line) {
                Ok(WireFrame::Event(_)) => state.forward(peer_id, &line),
                Ok(other) => {
                    debug!(target: "trellis::transport", frame = ?other, "ignoring non-event frame");
                }
                Err(err) => {
                    warn!(target: "trellis::transport", %actor, error = %err, "dropping malformed frame");
                }
            },
            Ok(None) => break,
            Err(err) => {
                debug!(target: "trellis::transport", %actor, error = %err, "read failed");
                break;
            }
        }
    }

    state.leave(peer_id);
    info!(target: "trellis::transport", %actor, peer_id, "client left");
    if let Err(err) = writer.await {
        debug!(target: "trellis::transport", error = %err, "writer task ended abnormally");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stalled_peer_is_evicted_and_presence_rebroadcast() {
        let state = RelayState::new(2);
        let (sender_tx, mut sender_rx) = mpsc::channel(2);
        let (stalled_tx, mut stalled_rx) = mpsc::channel(2);
        let sender = state.join(sender_tx);
        let stalled = state.join(stalled_tx);
        // Drain the join presence frames so only the stalled peer backs up.
        while sender_rx.try_recv().is_ok() {}

        state.forward(sender, "first");
        state.forward(sender, "second");

        assert_eq!(state.lock().outbound.len(), 1);
        assert!(!state.lock().outbound.contains_key(&stalled));
        let expected = WireFrame::Presence { active_users: 1 }
            .encode()
            .expect("presence encodes");
        assert_eq!(sender_rx.try_recv().ok(), Some(expected));

        let mut delivered = Vec::new();
        while let Ok(line) = stalled_rx.try_recv() {
            delivered.push(line);
        }
        assert_eq!(delivered.len(), 2);
        assert!(stalled_rx.is_closed());
    }

    #[test]
    fn forward_skips_the_sender() {
        let state = RelayState::new(8);
        let (alice_tx, mut alice_rx) = mpsc::channel(8);
        let (bob_tx, mut bob_rx) = mpsc::channel(8);
        let alice = state.join(alice_tx);
        state.join(bob_tx);
        while alice_rx.try_recv().is_ok() {}
        while bob_rx.try_recv().is_ok() {}

        state.forward(alice, "event");

        assert!(alice_rx.try_recv().is_err());
        assert_eq!(bob_rx.try_recv().ok().as_deref(), Some("event"));
    }
}
