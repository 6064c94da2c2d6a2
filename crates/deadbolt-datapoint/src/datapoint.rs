//! Datapoint records and change notifications.

use chrono::{DateTime, Utc};
use deadbolt_core::{DatapointId, DatapointType, DatapointValue};
use serde::{Deserialize, Serialize};

/// How a datapoint's current value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Default supplied by `get_or_create`; never observed on the device.
    Seeded,

    /// Reported by the device.
    Reported,

    /// Optimistic update after the transport acknowledged a write.
    Written,
}

/// Snapshot of one datapoint record.
///
/// Records are owned by the store; callers only ever see clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datapoint {
    pub id: DatapointId,
    pub dp_type: DatapointType,
    pub value: DatapointValue,
    pub source: ValueSource,
    pub updated_at: DateTime<Utc>,
    /// Device reports applied to this record so far.
    pub reports: u64,
}

impl Datapoint {
    pub(crate) fn new(id: DatapointId, value: DatapointValue, source: ValueSource) -> Self {
        Self {
            id,
            dp_type: value.value_type(),
            value,
            source,
            updated_at: Utc::now(),
            reports: u64::from(source == ValueSource::Reported),
        }
    }

    /// Boolean reading of the value, if it has one.
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    /// Whether the value came from the device rather than from this side.
    pub fn is_reported(&self) -> bool {
        self.source == ValueSource::Reported
    }
}

/// Change notification broadcast by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatapointUpdate {
    pub id: DatapointId,
    pub value: DatapointValue,
    pub source: ValueSource,
}

impl From<&Datapoint> for DatapointUpdate {
    fn from(datapoint: &Datapoint) -> Self {
        Self {
            id: datapoint.id,
            value: datapoint.value.clone(),
            source: datapoint.source,
        }
    }
}
