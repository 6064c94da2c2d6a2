//! Error types for datapoint and lock operations.
//!
//! A single error enum covers the transport failures surfaced by the
//! datapoint store, schema violations detected locally, and configuration
//! problems raised while building lock variants.

use crate::types::{DatapointId, DatapointType};

/// Result type alias for datapoint and lock operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, writing or configuring datapoints.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport is unavailable; the write was not attempted on the device.
    #[error("Device not connected: {device}")]
    NotConnected { device: String },

    /// Device declined the value.
    #[error("Write to datapoint {id} rejected: {reason}")]
    RejectedWrite { id: DatapointId, reason: String },

    /// Write addressed a datapoint that has no local record.
    #[error("Unknown datapoint: {id}")]
    UnknownDatapoint { id: DatapointId },

    /// Value type does not match the datapoint's declared type.
    #[error("Type mismatch on datapoint {id}: expected {expected}, got {actual}")]
    TypeMismatch {
        id: DatapointId,
        expected: DatapointType,
        actual: DatapointType,
    },

    /// Lock variant configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Variant registry JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new not-connected error.
    pub fn not_connected(device: impl Into<String>) -> Self {
        Self::NotConnected {
            device: device.into(),
        }
    }

    /// Create a new rejected write error.
    pub fn rejected_write(id: DatapointId, reason: impl Into<String>) -> Self {
        Self::RejectedWrite {
            id,
            reason: reason.into(),
        }
    }

    /// Create a new unknown datapoint error.
    pub fn unknown_datapoint(id: DatapointId) -> Self {
        Self::UnknownDatapoint { id }
    }

    /// Create a new type mismatch error.
    pub fn type_mismatch(id: DatapointId, expected: DatapointType, actual: DatapointType) -> Self {
        Self::TypeMismatch {
            id,
            expected,
            actual,
        }
    }

    /// Create a new configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether the failure came from the transport rather than local validation.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::NotConnected { .. } | Self::RejectedWrite { .. })
    }
}
