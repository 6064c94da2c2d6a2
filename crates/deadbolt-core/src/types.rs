use serde::{Deserialize, Serialize};
use std::fmt;

/// Datapoint identifier, unique within a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatapointId(u8);

impl DatapointId {
    /// Create a datapoint identifier.
    pub const fn new(id: u8) -> Self {
        DatapointId(id)
    }

    /// Get the raw identifier as u8.
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for DatapointId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for DatapointId {
    fn from(id: u8) -> Self {
        DatapointId(id)
    }
}

/// Declared semantic kind of a datapoint.
///
/// Discriminants follow the vendor's on-air type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DatapointType {
    Raw = 0,
    Bool = 1,
    Value = 2,
    String = 3,
    Enum = 4,
    Bitmap = 5,
}

impl fmt::Display for DatapointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatapointType::Raw => "raw",
            DatapointType::Bool => "bool",
            DatapointType::Value => "value",
            DatapointType::String => "string",
            DatapointType::Enum => "enum",
            DatapointType::Bitmap => "bitmap",
        };
        write!(f, "{}", name)
    }
}

/// A decoded datapoint value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DatapointValue {
    Raw(Vec<u8>),
    Bool(bool),
    Value(i32),
    String(String),
    Enum(u32),
    Bitmap(u32),
}

impl DatapointValue {
    /// The type tag this value belongs to.
    pub fn value_type(&self) -> DatapointType {
        match self {
            DatapointValue::Raw(_) => DatapointType::Raw,
            DatapointValue::Bool(_) => DatapointType::Bool,
            DatapointValue::Value(_) => DatapointType::Value,
            DatapointValue::String(_) => DatapointType::String,
            DatapointValue::Enum(_) => DatapointType::Enum,
            DatapointValue::Bitmap(_) => DatapointType::Bitmap,
        }
    }

    /// Interpret the value as a boolean.
    ///
    /// Numeric kinds are true when non-zero. Raw and string payloads have no
    /// boolean reading and return `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DatapointValue::Bool(b) => Some(*b),
            DatapointValue::Value(v) => Some(*v != 0),
            DatapointValue::Enum(v) | DatapointValue::Bitmap(v) => Some(*v != 0),
            DatapointValue::Raw(_) | DatapointValue::String(_) => None,
        }
    }
}

impl From<bool> for DatapointValue {
    fn from(value: bool) -> Self {
        DatapointValue::Bool(value)
    }
}

impl fmt::Display for DatapointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatapointValue::Raw(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            DatapointValue::Bool(b) => write!(f, "{}", b),
            DatapointValue::Value(v) => write!(f, "{}", v),
            DatapointValue::String(s) => write!(f, "{}", s),
            DatapointValue::Enum(v) | DatapointValue::Bitmap(v) => write!(f, "{}", v),
        }
    }
}

/// Opaque device address, used for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    pub fn new(address: impl Into<String>) -> Self {
        DeviceAddress(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceAddress {
    fn from(address: &str) -> Self {
        DeviceAddress::new(address)
    }
}

/// Derived lock state.
///
/// `Unknown` until the device has reported its status datapoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    #[default]
    Unknown,
    Locked,
    Unlocked,
}

impl LockState {
    /// Build a known state from a domain boolean (`true` = locked).
    pub fn from_locked(locked: bool) -> Self {
        if locked {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    /// `Some(true)` when locked, `Some(false)` when unlocked, `None` when unknown.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LockState::Locked => Some(true),
            LockState::Unlocked => Some(false),
            LockState::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, LockState::Unknown)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            LockState::Unknown => "unknown",
            LockState::Locked => "locked",
            LockState::Unlocked => "unlocked",
        };
        write!(f, "{}", state_str)
    }
}
