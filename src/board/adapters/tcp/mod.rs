//! TCP transport: newline-delimited JSON frames over a relay server.
//!
//! Every line on the wire is one JSON object with a `type` field:
//!
//! - `{"type":"hello","actor":"..."}`: first frame sent by a client.
//! - `{"type":"presence","activeUsers":n}`: sent by the relay on every
//!   join or leave; the first frame a client receives acknowledges its join.
//! - `{"type":"event","origin":"...","event":"moveTask","payload":{...}}`:
//!   a board event, forwarded by the relay to every other client.

mod client;
mod frame;
mod relay;

pub use client::TcpTransport;
pub use frame::WireFrame;
pub use relay::{DEFAULT_PEER_QUEUE_CAPACITY, RelayServer};
