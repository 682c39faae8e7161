//! Wire frames and line I/O shared by the TCP client and relay.

use crate::board::{
    domain::{ActorId, BoardEvent, EventEnvelope},
    ports::{TransportError, TransportResult},
};
use serde_json::{Map, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::Receiver;
use tracing::warn;

/// One line of the TCP protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    /// Client introduction.
    Hello {
        /// Connecting actor.
        actor: ActorId,
    },
    /// A board event and its origin.
    Event(EventEnvelope),
    /// Authoritative participant count.
    Presence {
        /// Number of connected clients.
        active_users: u32,
    },
}

impl WireFrame {
    /// Encodes the frame as a single JSON line (without the trailing
    /// newline).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Codec`] when serialization fails.
    pub fn encode(&self) -> TransportResult<String> {
        let value = match self {
            Self::Hello { actor } => serde_json::json!({ "type": "hello", "actor": actor }),
            Self::Presence { active_users } => {
                serde_json::json!({ "type": "presence", "activeUsers": active_users })
            }
            Self::Event(envelope) => {
                let mut fields = match serde_json::to_value(envelope.event()).map_err(codec)? {
                    Value::Object(fields) => fields,
                    other => {
                        return Err(TransportError::Codec(format!(
                            "event serialized to a non-object: {other}"
                        )));
                    }
                };
                fields.insert("type".to_owned(), Value::from("event"));
                fields.insert("origin".to_owned(), Value::from(envelope.origin().as_str()));
                Value::Object(fields)
            }
        };
        serde_json::to_string(&value).map_err(codec)
    }

    /// Decodes one JSON line.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Codec`] for malformed JSON, unknown frame
    /// types or invalid fields.
    pub fn decode(line: &str) -> TransportResult<Self> {
        let Value::Object(mut fields) = serde_json::from_str::<Value>(line).map_err(codec)? else {
            return Err(TransportError::Codec("frame is not a JSON object".to_owned()));
        };
        let kind = take_field::<String>(&mut fields, "type")?;
        match kind.as_str() {
            "hello" => Ok(Self::Hello {
                actor: take_field(&mut fields, "actor")?,
            }),
            "presence" => Ok(Self::Presence {
                active_users: take_field(&mut fields, "activeUsers")?,
            }),
            "event" => {
                let origin: ActorId = take_field(&mut fields, "origin")?;
                let event: BoardEvent =
                    serde_json::from_value(Value::Object(fields)).map_err(codec)?;
                Ok(Self::Event(EventEnvelope::new(origin, event)))
            }
            other => Err(TransportError::Codec(format!("unknown frame type '{other}'"))),
        }
    }
}

fn take_field<T: serde::de::DeserializeOwned>(
    fields: &mut Map<String, Value>,
    name: &str,
) -> TransportResult<T> {
    let value = fields
        .remove(name)
        .ok_or_else(|| TransportError::Codec(format!("frame is missing '{name}'")))?;
    serde_json::from_value(value).map_err(codec)
}

fn codec(err: serde_json::Error) -> TransportError {
    TransportError::Codec(err.to_string())
}

/// Writes `line` followed by a newline and flushes.
pub(super) async fn write_line(
    writer: &mut (impl AsyncWrite + Unpin),
    line: &str,
) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

/// Drains queued lines onto the socket until the queue closes, then shuts
/// the write half down.
pub(super) async fn write_loop(mut writer: OwnedWriteHalf, mut outbound: Receiver<String>) {
    while let Some(line) = outbound.recv().await {
        if let Err(err) = write_line(&mut writer, &line).await {
            warn!(target: "trellis::transport", error = %err, "failed to write frame; closing link");
            return;
        }
    }
    if let Err(err) = writer.shutdown().await {
        warn!(target: "trellis::transport", error = %err, "failed to shut down write half");
    }
}
