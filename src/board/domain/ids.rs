//! Identifier types for the board domain.
//!
//! Identifiers are opaque, non-empty strings. Generated identifiers carry a
//! `task-` or `column-` prefix, but peers may send any non-empty value and
//! the domain treats them uniformly.

use super::BoardDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`BoardDomainError::InvalidIdentifier`] when the value
            /// is empty after trimming.
            pub fn new(value: impl Into<String>) -> Result<Self, BoardDomainError> {
                let raw = value.into();
                let normalized = raw.trim();
                if normalized.is_empty() {
                    return Err(BoardDomainError::InvalidIdentifier {
                        kind: $label,
                        value: raw,
                    });
                }
                Ok(Self(normalized.to_owned()))
            }

            /// Builds `<prefix>-<suffix>`, which is never empty.
            pub(crate) fn prefixed(prefix: &str, suffix: impl fmt::Display) -> Self {
                Self(format!("{prefix}-{suffix}"))
            }

            /// Returns the identifier as `str`.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = BoardDomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = BoardDomainError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// Unique identifier of a task on the board.
    TaskId,
    "task"
);

string_identifier!(
    /// Unique identifier of a column on the board.
    ColumnId,
    "column"
);

string_identifier!(
    /// Identifier of a participant (local user or remote peer) that mutates
    /// the board.
    ActorId,
    "actor"
);
