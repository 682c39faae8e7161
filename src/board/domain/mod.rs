//! Domain model for the collaborative board.
//!
//! The domain holds the board snapshot types, the wire events peers
//! exchange, and the pure [`engine`] that moves a board from one valid
//! state to the next. Nothing here performs I/O.

mod activity;
mod board;
mod column;
mod command;
pub mod engine;
mod error;
mod event;
mod ids;
mod task;

pub use activity::{Activity, ActivityKind};
pub use board::Board;
pub use column::Column;
pub use command::BoardCommand;
pub use engine::{Mutation, MutationContext, MutationResult};
pub use error::{BoardDomainError, BoardInvariantError, ErrorKind, ParseActivityKindError};
pub use event::{BoardEvent, EventEnvelope};
pub use ids::{ActorId, ColumnId, TaskId};
pub use task::Task;
