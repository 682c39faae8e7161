//! Application services for the board: the entity store, session
//! configuration and the synchronized board session.

mod applier;
mod config;
mod connection;
mod outbox;
mod session;
mod store;

pub use config::{ConfigError, SyncConfig};
pub use connection::ConnectionState;
pub use session::{BoardSession, SyncError, SyncResult};
pub use store::BoardStore;
