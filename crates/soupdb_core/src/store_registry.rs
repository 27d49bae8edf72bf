//! Process-wide registry of open stores.

use crate::availability::AvailabilitySignal;
use crate::config::StoreConfig;
use crate::dir::{validate_store_name, StoreDir};
use crate::error::CoreResult;
use crate::store::Store;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Hands out at most one open [`Store`] per name.
///
/// Opening a name that is already open returns the same instance, so every
/// caller sees the same soups and the same serialized operation stream.
///
/// ```rust,no_run
/// use soupdb_core::{StoreConfig, StoreRegistry};
/// use std::sync::Arc;
///
/// let registry = StoreRegistry::new(StoreConfig::new("/data/stores"));
/// let a = registry.open_store("defaultStore")?;
/// let b = registry.open_store("defaultStore")?;
/// assert!(Arc::ptr_eq(&a, &b));
/// # Ok::<(), soupdb_core::CoreError>(())
/// ```
#[derive(Debug)]
pub struct StoreRegistry {
    config: StoreConfig,
    availability: Arc<AvailabilitySignal>,
    stores: Mutex<HashMap<String, Arc<Store>>>,
}

impl StoreRegistry {
    /// Creates a registry with its own availability signal.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_availability(config, Arc::new(AvailabilitySignal::new()))
    }

    /// Creates a registry whose stores report the given availability signal.
    pub fn with_availability(config: StoreConfig, availability: Arc<AvailabilitySignal>) -> Self {
        Self {
            config,
            availability,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Registry configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The signal shared by every store of this registry.
    pub fn availability(&self) -> &Arc<AvailabilitySignal> {
        &self.availability
    }

    /// Opens a store, or returns the instance that is already open.
    ///
    /// # Errors
    ///
    /// - `Validation` for names that cannot be used as a directory
    /// - `StoreNotFound` if missing and `create_if_missing` is false
    /// - `StoreLocked` if another process holds the store
    pub fn open_store(&self, name: &str) -> CoreResult<Arc<Store>> {
        validate_store_name(name)?;

        // Lock spans the open: at most one instance per name.
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get(name) {
            if store.is_open() {
                info!(target: "soupdb::registry", store = name, "returning existing store instance");
                return Ok(Arc::clone(store));
            }
        }

        let store = Arc::new(Store::open(
            name,
            &self.config,
            Arc::clone(&self.availability),
        )?);
        stores.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Closes a store if open and deletes its files.
    ///
    /// Removing a store that does not exist is not an error.
    pub fn remove_store(&self, name: &str) -> CoreResult<()> {
        validate_store_name(name)?;

        let mut stores = self.stores.lock();
        if let Some(store) = stores.remove(name) {
            store.close();
        }
        StoreDir::remove(&self.store_directory(name)?)?;
        info!(target: "soupdb::registry", store = name, "removed store");
        Ok(())
    }

    /// Directory a store's files live in.
    pub fn store_directory(&self, name: &str) -> CoreResult<PathBuf> {
        validate_store_name(name)?;
        Ok(self.config.root_dir.join(name))
    }

    /// True if a store with this name has a database on disk.
    pub fn persistent_store_exists(&self, name: &str) -> bool {
        self.store_directory(name)
            .map(|dir| StoreDir::exists(&dir))
            .unwrap_or(false)
    }

    /// Names of the stores currently open through this registry, sorted.
    pub fn open_store_names(&self) -> Vec<String> {
        let stores = self.stores.lock();
        let mut names: Vec<String> = stores
            .iter()
            .filter(|(_, store)| store.is_open())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Closes every open store.
    pub fn close_all(&self) {
        let mut stores = self.stores.lock();
        for (_, store) in stores.drain() {
            store.close();
        }
    }
}
