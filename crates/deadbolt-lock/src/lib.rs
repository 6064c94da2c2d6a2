//! Lock control surface for datapoint-protocol smart locks.
//!
//! A smart lock exposes two independent boolean datapoints: one the host
//! writes to request an action (control) and one the device reports its
//! actual state on (status). This crate turns that pair into a
//! locked/unlocked state and `lock()`/`unlock()` commands.
//!
//! - [`LockSynchronizer`] reads status through the datapoint store and issues
//!   control writes, parameterized by [`Polarity`] and [`WriteMode`].
//! - [`VariantRegistry`] maps device categories to [`LockConfig`]s and
//!   decides which devices get a synchronizer at all.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use deadbolt_core::{DatapointValue, DeviceAddress, LockState};
//! use deadbolt_datapoint::DatapointStore;
//! use deadbolt_datapoint::mock::MockTransport;
//! use deadbolt_lock::VariantRegistry;
//!
//! #[tokio::main]
//! async fn main() -> deadbolt_core::Result<()> {
//!     let (transport, _handle) = MockTransport::new();
//!     let store = Arc::new(DatapointStore::new(DeviceAddress::from("AA:BB"), transport));
//!
//!     let registry = VariantRegistry::with_defaults();
//!     let Some(lock) = registry.synchronizer_for("ms", Arc::clone(&store))? else {
//!         return Ok(());
//!     };
//!
//!     let status = lock.config().status_dp;
//!     store.apply_report(status, DatapointValue::Bool(false));
//!     assert_eq!(lock.is_locked(), LockState::Locked);
//!
//!     // Already locked: toggle mode sends nothing.
//!     assert!(!lock.lock().await?.was_sent());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod synchronizer;
pub mod variant;

pub use config::{LockConfig, Polarity, WriteMode};
pub use synchronizer::{CommandOutcome, LockSynchronizer};
pub use variant::VariantRegistry;
