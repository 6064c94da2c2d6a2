//! Device-family constants for datapoint-controlled smart locks.
//!
//! These values describe one known device family and are consumed only by
//! the default variant registrations. Lock logic receives its datapoint ids
//! through configuration and never reads these constants directly.
//!
//! # Smart lock family (`ms`)
//!
//! | Datapoint | Id | Type | Meaning |
//! |-----------|----|------|---------|
//! | Control | 33 | bool | Lock/unlock trigger (`automatic_lock`) |
//! | Status | 47 | bool | Motor state (`lock_motor_state`), `false` = locked |
//!
//! ```
//! use deadbolt_core::constants::*;
//!
//! assert_eq!(SMART_LOCK_CATEGORY, "ms");
//! assert_ne!(SMART_LOCK_CONTROL_DP, SMART_LOCK_STATUS_DP);
//! ```

use crate::types::DatapointId;

// ============================================================================
// Device Categories
// ============================================================================

/// Vendor category code for smart locks.
///
/// Only devices reporting this category get a lock synchronizer by default.
pub const SMART_LOCK_CATEGORY: &str = "ms";

// ============================================================================
// Smart Lock Datapoints
// ============================================================================

/// Control datapoint written to request a lock or unlock action.
pub const SMART_LOCK_CONTROL_DP: DatapointId = DatapointId::new(33);

/// Status datapoint carrying the lock motor state.
///
/// The motor reports `true` while running (unlocked) and `false` when off
/// (locked), so this family uses inverted polarity.
pub const SMART_LOCK_STATUS_DP: DatapointId = DatapointId::new(47);

// ============================================================================
// Store Configuration
// ============================================================================

/// Capacity of the datapoint update broadcast channel.
///
/// Slow subscribers that fall further behind than this observe a lag
/// notification instead of blocking the receive path.
pub const UPDATE_CHANNEL_CAPACITY: usize = 64;
