//! Step definitions for board synchronization scenarios.

pub mod world;

mod given;
mod then;
mod when;
