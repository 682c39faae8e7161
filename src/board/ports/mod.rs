//! Port contracts for the board.
//!
//! Ports define the collaborators the core consumes: identifier
//! allocation and a bidirectional transport to peers. The clock port is
//! [`mockable::Clock`].

pub mod id_generator;
pub mod transport;

pub use id_generator::IdGenerator;
pub use transport::{
    BoardTransport, InboundMessage, InboundSink, JoinAck, TransportError, TransportResult,
};
