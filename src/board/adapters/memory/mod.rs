//! In-process adapters for tests and single-process deployments.

mod clock;
mod hub;
mod ids;

pub use clock::ManualClock;
pub use hub::{BoardHub, HubTransport};
pub use ids::SequentialIdGenerator;
