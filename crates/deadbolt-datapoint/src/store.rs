//! Datapoint store.
//!
//! The store is the single owner of a device's datapoint records. Reads hand
//! out snapshots; writes go through the transport first and only touch the
//! local record after the transport reported success.
//!
//! ```text
//!  set_value ──► validate ──► transport.send_datapoint ──► record (Written)
//!                                      │                     unless reported
//!                                      │                     while in flight
//!                                      └─ failure: record untouched
//!
//!  apply_report ─────────────────────────────────────────► record (Reported)
//! ```
//!
//! Every record change is broadcast to subscribers as a [`DatapointUpdate`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use deadbolt_core::constants::UPDATE_CHANNEL_CAPACITY;
use deadbolt_core::{DatapointId, DatapointType, DatapointValue, DeviceAddress, Error, Result};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::datapoint::{Datapoint, DatapointUpdate, ValueSource};
use crate::transport::DatapointTransport;

/// Local view of one device's datapoints.
#[derive(Debug)]
pub struct DatapointStore<T> {
    address: DeviceAddress,
    transport: T,
    records: RwLock<HashMap<DatapointId, Datapoint>>,
    updates: broadcast::Sender<DatapointUpdate>,
}

impl<T: DatapointTransport> DatapointStore<T> {
    /// Create an empty store for the device at `address`.
    pub fn new(address: DeviceAddress, transport: T) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        debug!("{}: Creating datapoint store", address);

        Self {
            address,
            transport,
            records: RwLock::new(HashMap::new()),
            updates,
        }
    }

    /// Device address, for diagnostics.
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current record for `id`, or `None` if it was never created.
    pub fn get(&self, id: DatapointId) -> Option<Datapoint> {
        self.read().get(&id).cloned()
    }

    /// Return the record for `id`, creating it with `default_value` if absent.
    ///
    /// An existing value is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns `Error::TypeMismatch` if `default_value` is not of `dp_type`,
    /// or if the existing record was declared with a different type.
    pub fn get_or_create(
        &self,
        id: DatapointId,
        dp_type: DatapointType,
        default_value: DatapointValue,
    ) -> Result<Datapoint> {
        if default_value.value_type() != dp_type {
            return Err(Error::type_mismatch(id, dp_type, default_value.value_type()));
        }

        let mut records = self.write();
        if let Some(existing) = records.get(&id) {
            if existing.dp_type != dp_type {
                return Err(Error::type_mismatch(id, existing.dp_type, dp_type));
            }
            return Ok(existing.clone());
        }

        trace!(
            "{}: Seeding datapoint {} with {}",
            self.address, id, default_value
        );
        let datapoint = Datapoint::new(id, default_value, ValueSource::Seeded);
        records.insert(id, datapoint.clone());
        drop(records);

        self.notify(&datapoint);
        Ok(datapoint)
    }

    /// Write `value` to datapoint `id` through the transport.
    ///
    /// Suspends until the transport completes. On success the local record is
    /// updated optimistically, unless the device reported the datapoint while
    /// the write was in flight; that report is newer and stays. A later device
    /// report overrides the optimistic value. If the returned future is
    /// dropped before the transport completes, the record is left untouched.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownDatapoint` if `id` has no record.
    /// - `Error::TypeMismatch` if `value` does not match the record's type.
    /// - Any transport failure (`NotConnected`, `RejectedWrite`), unchanged.
    pub async fn set_value(&self, id: DatapointId, value: DatapointValue) -> Result<()> {
        let current = self.get(id).ok_or_else(|| Error::unknown_datapoint(id))?;
        if current.dp_type != value.value_type() {
            return Err(Error::type_mismatch(id, current.dp_type, value.value_type()));
        }

        debug!("{}: Writing datapoint {} = {}", self.address, id, value);
        if let Err(e) = self.transport.send_datapoint(id, &value).await {
            warn!("{}: Write to datapoint {} failed: {}", self.address, id, e);
            return Err(e);
        }

        self.store_written(id, value, current.reports);
        Ok(())
    }

    /// Apply a value received from the device.
    ///
    /// Creates the record if needed. A report of a different type than the
    /// existing record replaces the declaration, since the device is the
    /// authority on its own schema.
    pub fn apply_report(&self, id: DatapointId, value: DatapointValue) {
        if let Some(existing) = self.get(id)
            && existing.dp_type != value.value_type()
        {
            warn!(
                "{}: Datapoint {} reported as {}, previously {}",
                self.address,
                id,
                value.value_type(),
                existing.dp_type
            );
        }

        debug!("{}: Received datapoint {} = {}", self.address, id, value);
        self.store_value(id, value, ValueSource::Reported);
    }

    /// Subscribe to record changes.
    ///
    /// Receivers only see changes made after subscribing.
    pub fn subscribe(&self) -> broadcast::Receiver<DatapointUpdate> {
        self.updates.subscribe()
    }

    /// Identifiers of all known datapoints, in ascending order.
    pub fn ids(&self) -> Vec<DatapointId> {
        let mut ids: Vec<_> = self.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn store_value(&self, id: DatapointId, value: DatapointValue, source: ValueSource) {
        let datapoint = {
            let mut records = self.write();
            let record = records
                .entry(id)
                .and_modify(|dp| {
                    dp.dp_type = value.value_type();
                    dp.value = value.clone();
                    dp.source = source;
                    dp.updated_at = Utc::now();
                    if source == ValueSource::Reported {
                        dp.reports += 1;
                    }
                })
                .or_insert_with(|| Datapoint::new(id, value, source));
            record.clone()
        };

        self.notify(&datapoint);
    }

    /// Apply an acknowledged write, unless a report for `id` landed after
    /// `reports_before` was read.
    fn store_written(&self, id: DatapointId, value: DatapointValue, reports_before: u64) {
        let datapoint = {
            let mut records = self.write();
            let Some(dp) = records.get_mut(&id) else {
                return;
            };
            if dp.reports != reports_before {
                debug!(
                    "{}: Datapoint {} reported during write, keeping {}",
                    self.address, id, dp.value
                );
                return;
            }

            dp.value = value;
            dp.source = ValueSource::Written;
            dp.updated_at = Utc::now();
            dp.clone()
        };

        self.notify(&datapoint);
    }

    fn notify(&self, datapoint: &Datapoint) {
        // No subscribers is not an error.
        let _ = self.updates.send(DatapointUpdate::from(datapoint));
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<DatapointId, Datapoint>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<DatapointId, Datapoint>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use std::time::Duration;

    const CONTROL: DatapointId = DatapointId::new(33);
    const STATUS: DatapointId = DatapointId::new(47);

    fn store() -> (
        DatapointStore<MockTransport>,
        crate::mock::MockTransportHandle,
    ) {
        let (transport, handle) = MockTransport::new();
        (
            DatapointStore::new(DeviceAddress::from("AA:BB:CC:DD:EE:FF"), transport),
            handle,
        )
    }

    #[test]
    fn test_get_absent() {
        let (store, _handle) = store();
        assert!(store.get(STATUS).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_or_create_seeds_default() {
        let (store, _handle) = store();

        let dp = store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();

        assert_eq!(dp.value, DatapointValue::Bool(false));
        assert_eq!(dp.source, ValueSource::Seeded);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let (store, _handle) = store();

        let first = store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();
        let second = store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(true))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_or_create_never_overwrites_reported_value() {
        let (store, _handle) = store();
        store.apply_report(CONTROL, DatapointValue::Bool(true));

        let dp = store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();

        assert_eq!(dp.value, DatapointValue::Bool(true));
        assert_eq!(dp.source, ValueSource::Reported);
    }

    #[test]
    fn test_get_or_create_rejects_mismatched_default() {
        let (store, _handle) = store();

        let result = store.get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Value(0));

        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_or_create_rejects_mismatched_existing_type() {
        let (store, _handle) = store();
        store.apply_report(CONTROL, DatapointValue::Enum(1));

        let result = store.get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false));

        assert!(matches!(
            result,
            Err(Error::TypeMismatch {
                expected: DatapointType::Enum,
                actual: DatapointType::Bool,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_set_value_updates_record_optimistically() {
        let (store, handle) = store();
        store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();

        store
            .set_value(CONTROL, DatapointValue::Bool(true))
            .await
            .unwrap();

        let dp = store.get(CONTROL).unwrap();
        assert_eq!(dp.value, DatapointValue::Bool(true));
        assert_eq!(dp.source, ValueSource::Written);
        assert_eq!(handle.writes(), vec![(CONTROL, DatapointValue::Bool(true))]);
    }

    #[tokio::test]
    async fn test_set_value_unknown_datapoint() {
        let (store, handle) = store();

        let result = store.set_value(CONTROL, DatapointValue::Bool(true)).await;

        assert!(matches!(result, Err(Error::UnknownDatapoint { .. })));
        assert_eq!(handle.write_count(), 0);
    }

    #[tokio::test]
    async fn test_set_value_type_mismatch_skips_transport() {
        let (store, handle) = store();
        store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();

        let result = store.set_value(CONTROL, DatapointValue::Value(1)).await;

        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
        assert_eq!(handle.write_count(), 0);
    }

    #[tokio::test]
    async fn test_set_value_failure_leaves_record_unchanged() {
        let (store, handle) = store();
        store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();
        handle.set_connected(false);

        let result = store.set_value(CONTROL, DatapointValue::Bool(true)).await;

        assert!(matches!(result, Err(Error::NotConnected { .. })));
        let dp = store.get(CONTROL).unwrap();
        assert_eq!(dp.value, DatapointValue::Bool(false));
        assert_eq!(dp.source, ValueSource::Seeded);
    }

    #[tokio::test]
    async fn test_set_value_rejected_by_device() {
        let (store, handle) = store();
        store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();
        handle.reject(CONTROL);

        let result = store.set_value(CONTROL, DatapointValue::Bool(true)).await;

        assert!(matches!(result, Err(Error::RejectedWrite { .. })));
        assert_eq!(
            store.get(CONTROL).unwrap().value,
            DatapointValue::Bool(false)
        );
    }

    #[tokio::test]
    async fn test_cancelled_write_leaves_record_unchanged() {
        let (store, handle) = store();
        store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();
        handle.hold_writes();

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            store.set_value(CONTROL, DatapointValue::Bool(true)),
        )
        .await;

        assert!(result.is_err());
        let dp = store.get(CONTROL).unwrap();
        assert_eq!(dp.value, DatapointValue::Bool(false));
        assert_eq!(dp.source, ValueSource::Seeded);
        assert_eq!(handle.write_count(), 0);
    }

    #[tokio::test]
    async fn test_report_during_write_is_kept() {
        let (store, handle) = store();
        store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();
        handle.hold_writes();

        let write = store.set_value(CONTROL, DatapointValue::Bool(true));
        let report = async {
            handle.wait_for_pending(1).await;
            store.apply_report(CONTROL, DatapointValue::Bool(false));
            handle.release_writes();
        };
        let (result, ()) = tokio::join!(write, report);

        result.unwrap();
        let dp = store.get(CONTROL).unwrap();
        assert_eq!(dp.value, DatapointValue::Bool(false));
        assert_eq!(dp.source, ValueSource::Reported);
        assert_eq!(dp.reports, 1);
        assert_eq!(handle.writes(), vec![(CONTROL, DatapointValue::Bool(true))]);
    }

    #[test]
    fn test_report_overrides_optimistic_value() {
        let (store, _handle) = store();
        store.apply_report(STATUS, DatapointValue::Bool(true));
        store.apply_report(STATUS, DatapointValue::Bool(false));

        let dp = store.get(STATUS).unwrap();
        assert_eq!(dp.value, DatapointValue::Bool(false));
        assert!(dp.is_reported());
    }

    #[test]
    fn test_report_with_new_type_replaces_declaration() {
        let (store, _handle) = store();
        store.apply_report(STATUS, DatapointValue::Bool(true));
        store.apply_report(STATUS, DatapointValue::Enum(3));

        let dp = store.get(STATUS).unwrap();
        assert_eq!(dp.dp_type, DatapointType::Enum);
        assert_eq!(dp.value, DatapointValue::Enum(3));
    }

    #[tokio::test]
    async fn test_subscribe_receives_changes() {
        let (store, _handle) = store();
        let mut updates = store.subscribe();

        store.apply_report(STATUS, DatapointValue::Bool(false));
        store
            .get_or_create(CONTROL, DatapointType::Bool, DatapointValue::Bool(false))
            .unwrap();
        store
            .set_value(CONTROL, DatapointValue::Bool(true))
            .await
            .unwrap();

        let first = updates.recv().await.unwrap();
        assert_eq!(first.id, STATUS);
        assert_eq!(first.source, ValueSource::Reported);

        let second = updates.recv().await.unwrap();
        assert_eq!(second.source, ValueSource::Seeded);

        let third = updates.recv().await.unwrap();
        assert_eq!(third.value, DatapointValue::Bool(true));
        assert_eq!(third.source, ValueSource::Written);
    }

    #[test]
    fn test_ids_sorted() {
        let (store, _handle) = store();
        store.apply_report(STATUS, DatapointValue::Bool(true));
        store.apply_report(DatapointId::new(8), DatapointValue::Value(90));
        store.apply_report(CONTROL, DatapointValue::Bool(false));

        assert_eq!(
            store.ids(),
            vec![DatapointId::new(8), CONTROL, STATUS]
        );
    }
}
