//! Lock state synchronizer.
//!
//! Maps the locked/unlocked domain state onto a device's control and status
//! datapoints. The device stays the only authority on status: commands write
//! the control datapoint and never touch the status datapoint, whose value
//! changes only when the device reports it.
//!
//! # State
//!
//! ```text
//!            status report
//! Unknown ──────────────────► Locked ◄──────► Unlocked
//!                              (status reports only)
//! ```
//!
//! `lock()` and `unlock()` request a transition; it completes when the device
//! reports the new status.
//!
//! # Write modes
//!
//! | Mode | Pre-read | Value written | No-op |
//! |------|----------|---------------|-------|
//! | `DirectSet` | none | target state | never |
//! | `Toggle` | status, control | `!control` | already in target state |
//!
//! Commands on one synchronizer are serialized so that two toggles can never
//! read the same control value and cancel each other out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use deadbolt_core::{DatapointType, DatapointValue, DeviceAddress, LockState, Result};
use deadbolt_datapoint::{Datapoint, DatapointStore, DatapointTransport};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::config::{LockConfig, WriteMode};

/// Result of a successful lock or unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A write of `value` to the control datapoint was acknowledged.
    Sent { value: bool },

    /// Toggle mode only: the lock already was in the requested state.
    Unchanged,
}

impl CommandOutcome {
    pub fn was_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// Value written to the control datapoint, if any.
    pub fn written_value(&self) -> Option<bool> {
        match self {
            Self::Sent { value } => Some(*value),
            Self::Unchanged => None,
        }
    }
}

/// Lock control surface for one device.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use deadbolt_core::{DatapointId, DatapointValue, DeviceAddress, LockState};
/// use deadbolt_datapoint::DatapointStore;
/// use deadbolt_datapoint::mock::MockTransport;
/// use deadbolt_lock::{LockConfig, LockSynchronizer, Polarity, WriteMode};
///
/// #[tokio::main]
/// async fn main() -> deadbolt_core::Result<()> {
///     let (transport, handle) = MockTransport::new();
///     let store = Arc::new(DatapointStore::new(DeviceAddress::from("AA:BB"), transport));
///     let config = LockConfig::new(DatapointId::new(33), DatapointId::new(47))
///         .with_polarity(Polarity::Inverted)
///         .with_write_mode(WriteMode::Toggle);
///     let lock = LockSynchronizer::new(Arc::clone(&store), config)?;
///
///     assert_eq!(lock.is_locked(), LockState::Unknown);
///
///     // Motor running: unlocked.
///     store.apply_report(DatapointId::new(47), DatapointValue::Bool(true));
///     assert_eq!(lock.is_locked(), LockState::Unlocked);
///
///     lock.lock().await?;
///     assert_eq!(handle.writes(), vec![(DatapointId::new(33), DatapointValue::Bool(true))]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct LockSynchronizer<T> {
    store: Arc<DatapointStore<T>>,
    config: LockConfig,
    command: Mutex<()>,
    /// Report count of the last non-boolean status already warned about.
    warned_status: AtomicU64,
}

impl<T: DatapointTransport> LockSynchronizer<T> {
    /// Create a synchronizer over `store`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `config` does not validate.
    pub fn new(store: Arc<DatapointStore<T>>, config: LockConfig) -> Result<Self> {
        let config = config.validate()?;
        debug!(
            "{}: Lock on control {} / status {} ({:?}, {:?})",
            store.address(),
            config.control_dp,
            config.status_dp,
            config.polarity,
            config.write_mode
        );

        Ok(Self {
            store,
            config,
            command: Mutex::new(()),
            warned_status: AtomicU64::new(u64::MAX),
        })
    }

    pub fn address(&self) -> &DeviceAddress {
        self.store.address()
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<DatapointStore<T>> {
        &self.store
    }

    /// Current lock state as last reported (or optimistically written) on
    /// the status datapoint.
    ///
    /// Never writes. A status value with no boolean reading yields
    /// `LockState::Unknown`, with one warning per offending report.
    pub fn is_locked(&self) -> LockState {
        let Some(status) = self.store.get(self.config.status_dp) else {
            return LockState::Unknown;
        };

        match status.as_bool() {
            Some(raw) => {
                let state = self.config.polarity.state(raw);
                trace!("{}: Status {} is {}", self.address(), raw, state);
                state
            }
            None => {
                if self.first_sighting(&status) {
                    warn!(
                        "{}: Status datapoint {} holds non-boolean {} value",
                        self.address(),
                        status.id,
                        status.dp_type
                    );
                }
                LockState::Unknown
            }
        }
    }

    /// Request the locked state.
    pub async fn lock(&self) -> Result<CommandOutcome> {
        debug!("{}: Locking", self.address());
        self.set_locked(true).await
    }

    /// Request the unlocked state.
    pub async fn unlock(&self) -> Result<CommandOutcome> {
        debug!("{}: Unlocking", self.address());
        self.set_locked(false).await
    }

    /// Request `target` (`true` = locked) according to the configured write
    /// mode.
    ///
    /// In toggle mode an unknown state counts as "not in target" and the
    /// write is attempted.
    ///
    /// # Errors
    ///
    /// Propagates any failure from the store, such as `NotConnected` or
    /// `RejectedWrite`. The lock state is left as it was.
    pub async fn set_locked(&self, target: bool) -> Result<CommandOutcome> {
        let _command = self.command.lock().await;

        let value = match self.config.write_mode {
            WriteMode::DirectSet => {
                self.control()?;
                target
            }
            WriteMode::Toggle => {
                let state = self.is_locked();
                if state.as_bool() == Some(target) {
                    debug!("{}: Already {}, nothing to send", self.address(), state);
                    return Ok(CommandOutcome::Unchanged);
                }

                let control = self.control()?;
                !control.as_bool().unwrap_or(false)
            }
        };

        self.store
            .set_value(self.config.control_dp, DatapointValue::Bool(value))
            .await
            .inspect_err(|e| {
                warn!(
                    "{}: {} request failed: {}",
                    self.address(),
                    if target { "Lock" } else { "Unlock" },
                    e
                );
            })?;

        Ok(CommandOutcome::Sent { value })
    }

    fn first_sighting(&self, status: &Datapoint) -> bool {
        self.warned_status.swap(status.reports, Ordering::Relaxed) != status.reports
    }

    fn control(&self) -> Result<Datapoint> {
        self.store.get_or_create(
            self.config.control_dp,
            DatapointType::Bool,
            DatapointValue::Bool(false),
        )
    }
}
