//! Adapter implementations for board ports.

pub mod memory;
pub mod tcp;

mod uuid_ids;

pub use uuid_ids::UuidIdGenerator;
