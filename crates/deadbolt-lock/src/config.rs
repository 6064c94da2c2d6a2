//! Lock variant configuration.
//!
//! Device families disagree on two points: whether the status datapoint
//! reports "locked" as `true` or `false` ([`Polarity`]), and whether the
//! control datapoint takes an absolute target or flips on every write
//! ([`WriteMode`]). A [`LockConfig`] pins both down together with the two
//! datapoint ids.
//!
//! ```
//! use deadbolt_core::DatapointId;
//! use deadbolt_lock::{LockConfig, Polarity, WriteMode};
//!
//! let config = LockConfig::new(DatapointId::new(33), DatapointId::new(47))
//!     .with_polarity(Polarity::Inverted)
//!     .with_write_mode(WriteMode::Toggle)
//!     .validate()
//!     .unwrap();
//!
//! assert!(config.polarity.is_locked(false));
//! ```

use deadbolt_core::{DatapointId, Error, LockState, Result};
use serde::{Deserialize, Serialize};

/// Mapping between the raw status boolean and the locked state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// `true` means locked.
    #[default]
    Direct,

    /// `false` means locked.
    Inverted,
}

impl Polarity {
    /// Whether a raw status value means locked under this polarity.
    pub fn is_locked(&self, raw: bool) -> bool {
        match self {
            Polarity::Direct => raw,
            Polarity::Inverted => !raw,
        }
    }

    /// Lock state for a raw status value.
    pub fn state(&self, raw: bool) -> LockState {
        LockState::from_locked(self.is_locked(raw))
    }
}

/// How the control datapoint is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Write the target domain state; every request issues a write.
    #[default]
    DirectSet,

    /// Write the negation of the current control value, and only when the
    /// lock is not already in the requested state.
    Toggle,
}

/// Per-variant lock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Datapoint written to request a lock or unlock.
    pub control_dp: DatapointId,

    /// Datapoint the device uses to report lock state.
    pub status_dp: DatapointId,

    #[serde(default)]
    pub polarity: Polarity,

    #[serde(default)]
    pub write_mode: WriteMode,
}

impl LockConfig {
    /// Create a config with direct polarity and direct-set writes.
    pub fn new(control_dp: DatapointId, status_dp: DatapointId) -> Self {
        Self {
            control_dp,
            status_dp,
            polarity: Polarity::default(),
            write_mode: WriteMode::default(),
        }
    }

    /// Set the status polarity.
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Set the control write mode.
    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    /// Check the config and return it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the control and status datapoints
    /// share an id.
    pub fn validate(self) -> Result<Self> {
        if self.control_dp == self.status_dp {
            return Err(Error::invalid_config(format!(
                "control and status datapoints must differ, both are {}",
                self.control_dp
            )));
        }
        Ok(self)
    }
}
