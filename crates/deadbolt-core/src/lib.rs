//! Shared types for the Deadbolt datapoint lock workspace.
//!
//! Datapoint identifiers, typed values, lock domain state and the error
//! taxonomy used by the store and synchronizer crates.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
