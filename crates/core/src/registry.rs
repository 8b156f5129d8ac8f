//! Store registry
//!
//! The registry maps each configured store name to its resolved
//! [`AdapterConfig`]. It is built once from a top-level mapping of
//! store name -> settings block and is read-only afterwards, so it can be
//! shared behind an `Arc` for concurrent lookups.

use std::collections::BTreeMap;

use toml::Value;

use crate::adapter::AdapterConfig;
use crate::error::{Error, Result};
use crate::path::is_valid_store_name;
use crate::settings::{names, SettingsSource};

/// Immutable mapping of store name to adapter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    stores: BTreeMap<String, AdapterConfig>,
}

impl Registry {
    /// Build a registry from a top-level table of store blocks
    ///
    /// Every value must itself be a table. An empty table yields an empty
    /// registry.
    pub fn build(top_level: &toml::Table) -> Result<Self> {
        Self::from_sources(store_blocks(top_level)?)
    }

    /// Build a registry from any settings sources keyed by store name
    pub fn from_sources<I, K, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: SettingsSource,
    {
        let mut stores = BTreeMap::new();
        for (store, source) in sources {
            let store = store.into();
            let config = AdapterConfig::build(&store, &source)?;
            tracing::debug!(
                store = %store,
                bucket = config.bucket_name.as_deref().unwrap_or("-"),
                location = %config.location,
                "Resolved store configuration"
            );
            stores.insert(store, config);
        }

        tracing::info!(stores = stores.len(), "Store registry built");
        Ok(Self { stores })
    }

    /// Get a store's configuration by name
    pub fn get(&self, name: &str) -> Result<&AdapterConfig> {
        self.stores
            .get(name)
            .ok_or_else(|| Error::StoreNotFound(name.to_string()))
    }

    /// Check if a store is configured
    pub fn contains(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    /// Store names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    /// Stores and their configurations in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AdapterConfig)> {
        self.stores.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

/// Split a top-level table into its store blocks
///
/// Fails with [`Error::InvalidConfig`] on the first value that is not a table.
pub(crate) fn store_blocks(top_level: &toml::Table) -> Result<Vec<(&str, &toml::Table)>> {
    let mut blocks = Vec::with_capacity(top_level.len());
    for (store, block) in top_level {
        let Value::Table(block) = block else {
            return Err(Error::InvalidConfig(format!(
                "store '{store}' must be a table of settings, found {}",
                block.type_str()
            )));
        };
        if !is_valid_store_name(store) {
            tracing::warn!(store = %store, "Store name cannot be addressed as store/name on the command line");
        }
        for option in block.keys().filter(|k| !names::is_recognized(k)) {
            tracing::warn!(store = %store, option = %option, "Ignoring unrecognized store option");
        }
        blocks.push((store.as_str(), block));
    }
    Ok(blocks)
}
