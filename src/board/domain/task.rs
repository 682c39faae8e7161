//! Task entity.

use super::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A titled work item owned by exactly one column.
///
/// Title validation happens in the mutation engine before a task reaches the
/// board; the entity itself only normalizes whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task whose creation and update timestamps are both
    /// `timestamp`.
    #[must_use]
    pub fn new(
        id: TaskId,
        title: &str,
        description: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.trim().to_owned(),
            description: normalize_description(description),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy with the title trimmed and a blank description
    /// collapsed to `None`, keeping both timestamps.
    pub(super) fn normalized(&self) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.trim().to_owned(),
            description: normalize_description(self.description()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Replaces title and description and advances `updated_at`.
    ///
    /// `updated_at` never moves backwards, even when `now` is behind the
    /// previous update (clock skew between peers).
    pub(super) fn revise(&mut self, title: &str, description: Option<&str>, now: DateTime<Utc>) {
        title.trim().clone_into(&mut self.title);
        self.description = normalize_description(description);
        self.updated_at = self.updated_at.max(now);
    }
}

/// Collapses empty or whitespace-only descriptions to `None`.
pub(super) fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}
