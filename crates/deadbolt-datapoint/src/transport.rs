//! Transport contract for carrying datapoint writes to a device.
//!
//! The link layer (BLE pairing, GATT, encryption, frame encoding) lives
//! outside this workspace. It plugs in by implementing [`DatapointTransport`]
//! for writes and by feeding received values into
//! [`DatapointStore::apply_report`](crate::DatapointStore::apply_report).
//!
//! The method returns a `Send` future so that stores can be driven from
//! spawned Tokio tasks. Implementations may still use plain `async fn`.

use std::future::Future;

use deadbolt_core::{DatapointId, DatapointValue, Result};

/// Link to a single device.
///
/// # Errors
///
/// Implementations report failures with the shared error type:
/// - `Error::NotConnected` when the link is down; no retry is expected here.
/// - `Error::RejectedWrite` when the device declined the value.
///
/// # Examples
///
/// ```
/// use deadbolt_core::{DatapointId, DatapointValue, Error, Result};
/// use deadbolt_datapoint::DatapointTransport;
///
/// struct Offline;
///
/// impl DatapointTransport for Offline {
///     async fn send_datapoint(&self, _id: DatapointId, _value: &DatapointValue) -> Result<()> {
///         Err(Error::not_connected("offline"))
///     }
/// }
/// ```
pub trait DatapointTransport: Send + Sync {
    /// Apply `value` to datapoint `id` on the device.
    ///
    /// Resolves once the device acknowledged the write or the write failed.
    fn send_datapoint(
        &self,
        id: DatapointId,
        value: &DatapointValue,
    ) -> impl Future<Output = Result<()>> + Send;
}
