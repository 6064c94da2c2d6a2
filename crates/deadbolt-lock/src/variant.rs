//! Device-variant registry.
//!
//! Decides which devices get a lock synchronizer at all and with which
//! [`LockConfig`]. Entries are keyed by the vendor category code the device
//! reports during session setup.
//!
//! # Configuration file
//!
//! Variants can be loaded from JSON, one entry per category:
//!
//! ```json
//! {
//!   "ms": { "control_dp": 33, "status_dp": 47, "polarity": "inverted", "write_mode": "toggle" },
//!   "jtmspro": { "control_dp": 6, "status_dp": 47 }
//! }
//! ```
//!
//! Omitted `polarity` and `write_mode` default to `direct` and `direct_set`.

use std::collections::HashMap;
use std::sync::Arc;

use deadbolt_core::Result;
use deadbolt_core::constants::{SMART_LOCK_CATEGORY, SMART_LOCK_CONTROL_DP, SMART_LOCK_STATUS_DP};
use deadbolt_datapoint::{DatapointStore, DatapointTransport};
use tracing::{debug, info};

use crate::config::{LockConfig, Polarity, WriteMode};
use crate::synchronizer::LockSynchronizer;

/// Category → lock configuration lookup.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    variants: HashMap<String, LockConfig>,
}

impl VariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in smart lock family.
    ///
    /// # Examples
    ///
    /// ```
    /// use deadbolt_lock::{Polarity, VariantRegistry, WriteMode};
    ///
    /// let registry = VariantRegistry::with_defaults();
    /// let config = registry.lookup("ms").unwrap();
    ///
    /// assert_eq!(config.control_dp.as_u8(), 33);
    /// assert_eq!(config.status_dp.as_u8(), 47);
    /// assert_eq!(config.polarity, Polarity::Inverted);
    /// assert_eq!(config.write_mode, WriteMode::Toggle);
    /// assert!(!registry.supports("wk"));
    /// ```
    pub fn with_defaults() -> Self {
        let mut variants = HashMap::new();
        variants.insert(
            SMART_LOCK_CATEGORY.to_string(),
            LockConfig::new(SMART_LOCK_CONTROL_DP, SMART_LOCK_STATUS_DP)
                .with_polarity(Polarity::Inverted)
                .with_write_mode(WriteMode::Toggle),
        );
        Self { variants }
    }

    /// Load variants from a JSON object keyed by category.
    ///
    /// # Errors
    ///
    /// - `Error::Json` if the document does not parse.
    /// - `Error::InvalidConfig` if any entry fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, LockConfig> = serde_json::from_str(json)?;

        let mut registry = Self::new();
        for (category, config) in entries {
            registry.register(category, config)?;
        }

        info!("Loaded {} lock variant(s)", registry.len());
        Ok(registry)
    }

    /// Add or replace the config for `category`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `config` fails validation; the
    /// registry is left unchanged.
    pub fn register(&mut self, category: impl Into<String>, config: LockConfig) -> Result<()> {
        let config = config.validate()?;
        let category = category.into();
        debug!("Registering lock variant for category {}", category);
        self.variants.insert(category, config);
        Ok(())
    }

    pub fn lookup(&self, category: &str) -> Option<&LockConfig> {
        self.variants.get(category)
    }

    /// Whether devices of `category` get a lock synchronizer.
    pub fn supports(&self, category: &str) -> bool {
        self.variants.contains_key(category)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Build a synchronizer for a device of `category`.
    ///
    /// Returns `Ok(None)` for categories that are not locks.
    pub fn synchronizer_for<T: DatapointTransport>(
        &self,
        category: &str,
        store: Arc<DatapointStore<T>>,
    ) -> Result<Option<LockSynchronizer<T>>> {
        let Some(config) = self.lookup(category) else {
            debug!(
                "{}: Category {} has no lock variant",
                store.address(),
                category
            );
            return Ok(None);
        };

        LockSynchronizer::new(store, *config).map(Some)
    }
}
