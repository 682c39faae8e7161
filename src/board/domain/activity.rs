//! Per-task activity records used for transient UI affordances.

use super::{ActorId, ParseActivityKindError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of the most recent action taken against a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// The task was created.
    Created,
    /// The task title or description changed.
    Updated,
    /// The task moved within or between columns.
    Moved,
    /// The task was deleted. Boards never retain this entry; it exists so
    /// that peers and presentation can name the action.
    Deleted,
}

impl ActivityKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Moved => "moved",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ActivityKind {
    type Error = ParseActivityKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "moved" => Ok(Self::Moved),
            "deleted" => Ok(Self::Deleted),
            _ => Err(ParseActivityKindError(value.to_owned())),
        }
    }
}

/// The last recorded action against a task and who performed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    actor: ActorId,
    action: ActivityKind,
    recorded_at: DateTime<Utc>,
}

impl Activity {
    /// Creates an activity record.
    #[must_use]
    pub const fn new(actor: ActorId, action: ActivityKind, recorded_at: DateTime<Utc>) -> Self {
        Self {
            actor,
            action,
            recorded_at,
        }
    }

    /// Returns the acting participant.
    #[must_use]
    pub const fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// Returns the recorded action.
    #[must_use]
    pub const fn action(&self) -> ActivityKind {
        self.action
    }

    /// Returns when the action was applied locally.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Returns whether the record is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.recorded_at) >= ttl
    }
}
