//! Trellis: a collaborative kanban board core.
//!
//! This crate provides the board state model, the mutation algebra that
//! keeps it consistent, and the synchronization layer that shares edits
//! between connected participants.
//!
//! # Architecture
//!
//! Trellis follows hexagonal architecture principles:
//!
//! - **Domain**: Pure board state and mutation logic with no I/O
//! - **Ports**: Abstract trait interfaces for id generation and transport
//! - **Adapters**: Concrete implementations of ports (in-memory hub, TCP)
//!
//! # Modules
//!
//! - [`board`]: Board model, mutation engine and synchronized sessions

pub mod board;
