//! Collaborative board: state model, mutation engine and synchronization.
//!
//! A board is a set of tasks owned by ordered columns. Every change goes
//! through the pure mutation engine, so a local edit and the same edit
//! received from a peer run identical code. The module follows hexagonal
//! architecture:
//!
//! - Domain types and the mutation engine in [`domain`]
//! - Port contracts (id generation, transport) in [`ports`]
//! - Adapter implementations (in-memory hub, TCP relay, UUID ids) in
//!   [`adapters`]
//! - The entity store and synchronized session in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
