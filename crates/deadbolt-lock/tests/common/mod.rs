//! Common test utilities for lock integration tests.
//!
//! - `setup` builds a store over a mock transport plus a synchronizer.
//! - `spawn_device` runs a simulated lock that answers control writes with
//!   status reports, so tests can observe convergence end to end.
//! - `wait_for_state` polls the synchronizer until the status converges.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use deadbolt_core::{DatapointId, DatapointValue, DeviceAddress, LockState};
use deadbolt_datapoint::mock::{MockTransport, MockTransportHandle};
use deadbolt_datapoint::{DatapointStore, ValueSource};
use deadbolt_lock::{LockConfig, LockSynchronizer, Polarity, WriteMode};
use tokio::task::JoinHandle;

pub const CONTROL: DatapointId = DatapointId::new(33);
pub const STATUS: DatapointId = DatapointId::new(47);
pub const TEST_ADDRESS: &str = "DC:23:4D:11:22:33";

pub type Store = Arc<DatapointStore<MockTransport>>;

/// Install a test log subscriber; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config(polarity: Polarity, write_mode: WriteMode) -> LockConfig {
    LockConfig::new(CONTROL, STATUS)
        .with_polarity(polarity)
        .with_write_mode(write_mode)
}

/// Store, shared synchronizer and transport handle for one device.
pub fn setup(
    polarity: Polarity,
    write_mode: WriteMode,
) -> (Store, Arc<LockSynchronizer<MockTransport>>, MockTransportHandle) {
    init_tracing();

    let (transport, handle) = MockTransport::with_name(TEST_ADDRESS.to_string());
    let store = Arc::new(DatapointStore::new(DeviceAddress::from(TEST_ADDRESS), transport));
    let lock = LockSynchronizer::new(Arc::clone(&store), config(polarity, write_mode))
        .expect("valid test config");

    (store, Arc::new(lock), handle)
}

/// Raw status value a device of `polarity` reports for `locked`.
pub fn raw_status(polarity: Polarity, locked: bool) -> bool {
    match polarity {
        Polarity::Direct => locked,
        Polarity::Inverted => !locked,
    }
}

/// Report the domain state `locked` on the status datapoint.
pub fn report_locked(store: &Store, polarity: Polarity, locked: bool) {
    store.apply_report(STATUS, DatapointValue::Bool(raw_status(polarity, locked)));
}

/// Simulated lock firmware.
///
/// Reports `initially_locked`, then answers every acknowledged control write
/// with a status report: direct-set devices move to the written state, toggle
/// devices flip.
pub fn spawn_device(store: Store, config: LockConfig, initially_locked: bool) -> JoinHandle<()> {
    let mut updates = store.subscribe();
    report_locked(&store, config.polarity, initially_locked);

    tokio::spawn(async move {
        let mut locked = initially_locked;
        while let Ok(update) = updates.recv().await {
            if update.id != config.control_dp || update.source != ValueSource::Written {
                continue;
            }

            locked = match config.write_mode {
                WriteMode::DirectSet => update.value.as_bool().unwrap_or(locked),
                WriteMode::Toggle => !locked,
            };
            report_locked(&store, config.polarity, locked);
        }
    })
}

/// Wait until the synchronizer reports `expected`, failing after one second.
pub async fn wait_for_state(lock: &LockSynchronizer<MockTransport>, expected: LockState) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while lock.is_locked() != expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("lock never reached {expected}, still {}", lock.is_locked()));
}
