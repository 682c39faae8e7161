//! TCP client transport.

use super::frame::{WireFrame, write_line, write_loop};
use crate::board::{
    domain::{ActorId, EventEnvelope},
    ports::{BoardTransport, InboundSink, JoinAck, TransportError, TransportResult},
};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long `connect` waits for the relay's join acknowledgement.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Frames queued for the writer task before `send` reports a stalled link.
const OUTBOUND_CAPACITY: usize = 1024;

/// [`BoardTransport`] speaking the line protocol to a [`super::RelayServer`].
///
/// Outbound frames are queued onto a bounded writer queue, so `send` never
/// waits on the socket; a full queue is reported as an unavailable link. Inbound frames are decoded on a reader task and handed to the
/// session's [`InboundSink`].
#[derive(Debug)]
pub struct TcpTransport {
    address: String,
    link: Mutex<Option<TcpLink>>,
}

#[derive(Debug)]
struct TcpLink {
    outbound: mpsc::Sender<String>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl TcpTransport {
    /// Creates a transport for the relay at `address` (`host:port`).
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            link: Mutex::new(None),
        }
    }

    /// Returns the relay address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    fn lock(&self) -> MutexGuard<'_, Option<TcpLink>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        let link = self.link.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(TcpLink { reader, .. }) = link {
            // The writer task sees its queue close, flushes and shuts the
            // socket down on its own.
            reader.abort();
        }
    }
}

#[async_trait]
impl BoardTransport for TcpTransport {
    async fn connect(&self, actor: &ActorId, inbound: InboundSink) -> TransportResult<JoinAck> {
        self.disconnect().await?;

        let stream = TcpStream::connect(self.address.as_str())
            .await
            .map_err(|err| TransportError::Unavailable(format!("{}: {err}", self.address)))?;
        let (read_half, mut write_half) = stream.into_split();
        let hello = WireFrame::Hello {
            actor: actor.clone(),
        }
        .encode()?;
        write_line(&mut write_half, &hello)
            .await
            .map_err(TransportError::io)?;

        let mut lines = BufReader::new(read_half).lines();
        let first = tokio::time::timeout(JOIN_TIMEOUT, lines.next_line())
            .await
            .map_err(|_| {
                TransportError::Unavailable("timed out waiting for join acknowledgement".to_owned())
            })?
            .map_err(TransportError::io)?
            .ok_or_else(|| {
                TransportError::Unavailable("relay closed the connection during join".to_owned())
            })?;
        let ack = match WireFrame::decode(&first)? {
            WireFrame::Presence { active_users } => JoinAck::with_active_users(active_users),
            other => {
                return Err(TransportError::Codec(format!(
                    "expected presence acknowledgement, got {other:?}"
                )));
            }
        };

        let (outbound, queued) = mpsc::channel(OUTBOUND_CAPACITY);
        let writer = tokio::spawn(write_loop(write_half, queued));
        let reader = tokio::spawn(read_loop(lines, inbound));
        *self.lock() = Some(TcpLink {
            outbound,
            reader,
            writer,
        });
        Ok(ack)
    }

    async fn disconnect(&self) -> TransportResult<()> {
        let link = self.lock().take();
        if let Some(TcpLink {
            outbound,
            reader,
            writer,
        }) = link
        {
            reader.abort();
            // Closing the queue lets the writer flush what is pending and
            // shut the socket down.
            drop(outbound);
            if let Err(err) = writer.await {
                debug!(target: "trellis::transport", error = %err, "writer task ended abnormally");
            }
        }
        Ok(())
    }

    fn send(&self, envelope: &EventEnvelope) -> TransportResult<()> {
        let line = WireFrame::Event(envelope.clone()).encode()?;
        let guard = self.lock();
        let link = guard.as_ref().ok_or(TransportError::NotConnected)?;
        link.outbound.try_send(line).map_err(|err| match err {
            TrySendError::Full(_) => {
                TransportError::Unavailable("outbound queue full; link stalled".to_owned())
            }
            TrySendError::Closed(_) => TransportError::NotConnected,
        })
    }
}

async fn read_loop(mut lines: Lines<BufReader<OwnedReadHalf>>, inbound: InboundSink) {
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                inbound.connection_lost("relay closed the connection");
                return;
            }
            Err(err) => {
                inbound.connection_lost(err.to_string());
                return;
            }
        };
        let accepted = match WireFrame::decode(&line) {
            Ok(WireFrame::Event(envelope)) => inbound.deliver(envelope),
            Ok(WireFrame::Presence { active_users }) => inbound.update_presence(active_users),
            Ok(WireFrame::Hello { actor }) => {
                debug!(target: "trellis::transport", %actor, "ignoring hello frame from relay");
                true
            }
            Err(err) => {
                warn!(target: "trellis::transport", error = %err, "dropping malformed frame");
                true
            }
        };
        if !accepted {
            debug!(target: "trellis::transport", "session closed; stopping reader");
            return;
        }
    }
}
