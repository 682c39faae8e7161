//! Session configuration.

use crate::board::domain::ActorId;
use chrono::TimeDelta;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while loading a [`SyncConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid sync configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid sync configuration value for '{field}': {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Tunables for a board session.
///
/// # Examples
///
/// ```
/// use trellis::board::services::SyncConfig;
///
/// let config = SyncConfig::from_toml_str(
///     r#"
///     actor = "alice"
///     outbox_capacity = 16
///     activity_ttl_ms = 2500
///     "#,
/// )
/// .expect("valid config");
/// assert_eq!(config.actor.as_str(), "alice");
/// assert_eq!(config.outbox_capacity, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Identity of the local participant, attached to every emitted event.
    pub actor: ActorId,
    /// Maximum number of events held while disconnected. When full, the
    /// oldest event is dropped.
    pub outbox_capacity: usize,
    /// Age after which activity entries are cleared. `None` or `0` keeps
    /// them until the task changes again; `0` is the only way to disable
    /// expiry from a TOML document.
    pub activity_ttl_ms: Option<u64>,
    /// Period of the activity expiry sweep.
    pub expiry_sweep_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            actor: ActorId::prefixed("actor", Uuid::new_v4()),
            outbox_capacity: 256,
            activity_ttl_ms: Some(5_000),
            expiry_sweep_ms: 1_000,
        }
    }
}

impl SyncConfig {
    /// Creates the default configuration for `actor`.
    #[must_use]
    pub fn for_actor(actor: ActorId) -> Self {
        Self {
            actor,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document. Missing keys take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed TOML, unknown keys or invalid
    /// values.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Disables activity expiry.
    #[must_use]
    pub const fn without_activity_ttl(mut self) -> Self {
        self.activity_ttl_ms = None;
        self
    }

    /// Sets the outbox capacity.
    #[must_use]
    pub const fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when expiry is enabled with a
    /// zero sweep period.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.expires_activity() && self.expiry_sweep_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "expiry_sweep_ms",
                reason: "must be positive when activity expiry is enabled",
            });
        }
        Ok(())
    }

    /// Returns the activity TTL, if expiry is enabled.
    #[must_use]
    pub fn activity_ttl(&self) -> Option<TimeDelta> {
        self.activity_ttl_ms
            .filter(|ms| *ms > 0)
            .and_then(|ms| i64::try_from(ms).ok())
            .map(TimeDelta::milliseconds)
    }

    /// Returns the sweep period, if expiry is enabled.
    #[must_use]
    pub const fn expiry_sweep(&self) -> Option<Duration> {
        if self.expires_activity() {
            Some(Duration::from_millis(self.expiry_sweep_ms))
        } else {
            None
        }
    }

    const fn expires_activity(&self) -> bool {
        matches!(self.activity_ttl_ms, Some(ttl) if ttl > 0)
    }
}
