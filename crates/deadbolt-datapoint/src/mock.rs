//! Mock transport implementation for testing and development.
//!
//! [`MockTransport`] acknowledges writes in memory. Its paired
//! [`MockTransportHandle`] lets tests inspect the writes that reached the
//! "device", take the link down, make the device reject specific
//! datapoints, and hold writes in flight to exercise cancellation and
//! report races.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use deadbolt_core::{DatapointId, DatapointValue, Error, Result};
use tokio::sync::watch;

use crate::transport::DatapointTransport;

#[derive(Debug)]
struct Shared {
    name: String,
    connected: AtomicBool,
    writes: Mutex<Vec<(DatapointId, DatapointValue)>>,
    rejected: Mutex<HashSet<DatapointId>>,
    /// `true` while writes may complete.
    gate: watch::Sender<bool>,
    /// Writes currently waiting at the gate.
    pending: watch::Sender<usize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory transport.
///
/// # Examples
///
/// ```
/// use deadbolt_core::{DatapointId, DatapointValue};
/// use deadbolt_datapoint::DatapointTransport;
/// use deadbolt_datapoint::mock::MockTransport;
///
/// #[tokio::main]
/// async fn main() -> deadbolt_core::Result<()> {
///     let (transport, handle) = MockTransport::new();
///
///     transport.send_datapoint(DatapointId::new(1), &DatapointValue::Bool(true)).await?;
///     assert_eq!(handle.write_count(), 1);
///
///     handle.set_connected(false);
///     assert!(transport.send_datapoint(DatapointId::new(1), &DatapointValue::Bool(false)).await.is_err());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    shared: Arc<Shared>,
}

impl MockTransport {
    /// Create a connected mock transport with the default name.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("Mock Transport".to_string())
    }

    /// Create a connected mock transport with a custom name.
    ///
    /// The name appears in `NotConnected` errors.
    pub fn with_name(name: String) -> (Self, MockTransportHandle) {
        let (gate, _) = watch::channel(true);
        let (pending, _) = watch::channel(0);

        let shared = Arc::new(Shared {
            name,
            connected: AtomicBool::new(true),
            writes: Mutex::new(Vec::new()),
            rejected: Mutex::new(HashSet::new()),
            gate,
            pending,
        });

        let transport = Self {
            shared: Arc::clone(&shared),
        };
        (transport, MockTransportHandle { shared })
    }

    async fn wait_for_gate(&self) {
        let mut gate = self.shared.gate.subscribe();
        if *gate.borrow() {
            return;
        }

        let _pending = PendingGuard::enter(&self.shared.pending);
        // The sender lives in `shared`, so the channel cannot close under us.
        let _ = gate.wait_for(|open| *open).await;
    }
}

/// Counts a write as pending for as long as it is alive, including when the
/// write future is dropped while held.
struct PendingGuard<'a>(&'a watch::Sender<usize>);

impl<'a> PendingGuard<'a> {
    fn enter(pending: &'a watch::Sender<usize>) -> Self {
        pending.send_modify(|n| *n += 1);
        Self(pending)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

impl DatapointTransport for MockTransport {
    async fn send_datapoint(&self, id: DatapointId, value: &DatapointValue) -> Result<()> {
        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(Error::not_connected(self.shared.name.clone()));
        }

        self.wait_for_gate().await;

        if !self.shared.connected.load(Ordering::SeqCst) {
            return Err(Error::not_connected(self.shared.name.clone()));
        }
        if lock(&self.shared.rejected).contains(&id) {
            return Err(Error::rejected_write(id, "rejected by mock device"));
        }

        lock(&self.shared.writes).push((id, value.clone()));
        Ok(())
    }
}

/// Handle for controlling a mock transport.
///
/// Cloneable and shareable across tasks.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    shared: Arc<Shared>,
}

impl MockTransportHandle {
    /// Every write the device acknowledged, in order.
    pub fn writes(&self) -> Vec<(DatapointId, DatapointValue)> {
        lock(&self.shared.writes).clone()
    }

    pub fn write_count(&self) -> usize {
        lock(&self.shared.writes).len()
    }

    pub fn clear_writes(&self) {
        lock(&self.shared.writes).clear();
    }

    /// Bring the link up or down.
    pub fn set_connected(&self, connected: bool) {
        self.shared.connected.store(connected, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Make the device reject writes to `id`.
    pub fn reject(&self, id: DatapointId) {
        lock(&self.shared.rejected).insert(id);
    }

    /// Make the device accept writes to `id` again.
    pub fn accept(&self, id: DatapointId) {
        lock(&self.shared.rejected).remove(&id);
    }

    /// Keep subsequent writes in flight until [`release_writes`](Self::release_writes).
    pub fn hold_writes(&self) {
        self.shared.gate.send_replace(false);
    }

    /// Let held and future writes complete.
    pub fn release_writes(&self) {
        self.shared.gate.send_replace(true);
    }

    /// Wait until at least `count` writes are held in flight.
    pub async fn wait_for_pending(&self, count: usize) {
        let mut pending = self.shared.pending.subscribe();
        let _ = pending.wait_for(|n| *n >= count).await;
    }

    /// Get the transport name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}
