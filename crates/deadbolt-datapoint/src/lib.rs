//! Datapoint store for a single vendor-protocol device.
//!
//! A device exposes its state as a set of small-integer addressed, typed
//! values called datapoints. This crate holds the local view of those values
//! and mediates every read and write:
//!
//! - [`DatapointStore`] owns the records, applies device reports, and forwards
//!   writes to the transport, updating the local record only once the
//!   transport has acknowledged the write.
//! - [`DatapointTransport`] is the narrow contract the BLE session (or any
//!   other link) implements to carry writes to the device.
//! - [`mock::MockTransport`] is an in-memory transport with a control handle
//!   for tests and development.
//!
//! # Example
//!
//! ```
//! use deadbolt_core::{DatapointId, DatapointType, DatapointValue, DeviceAddress};
//! use deadbolt_datapoint::DatapointStore;
//! use deadbolt_datapoint::mock::MockTransport;
//!
//! #[tokio::main]
//! async fn main() -> deadbolt_core::Result<()> {
//!     let (transport, handle) = MockTransport::new();
//!     let store = DatapointStore::new(DeviceAddress::from("AA:BB:CC:DD:EE:FF"), transport);
//!
//!     let id = DatapointId::new(33);
//!     store.get_or_create(id, DatapointType::Bool, DatapointValue::Bool(false))?;
//!     store.set_value(id, DatapointValue::Bool(true)).await?;
//!
//!     assert_eq!(handle.writes(), vec![(id, DatapointValue::Bool(true))]);
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! Records are guarded by a synchronous lock that is never held across an
//! `.await`. Device reports may be applied from any task at any time,
//! including while a write is in flight.

pub mod datapoint;
#[cfg(feature = "mock")]
pub mod mock;
pub mod store;
pub mod transport;

pub use datapoint::{Datapoint, DatapointUpdate, ValueSource};
pub use store::DatapointStore;
pub use transport::DatapointTransport;
