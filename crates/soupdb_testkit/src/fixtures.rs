//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores and
//! registries, and the common people scenario.

use crate::fault::{FaultInjector, FaultyBackend};
use soupdb_core::{AvailabilitySignal, Store, StoreConfig, StoreRegistry};
use soupdb_storage::SqliteBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Name used for stores created by the fixtures.
pub const TEST_STORE: &str = "testStore";

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The temporary root (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Store::open_in_memory(TEST_STORE).expect("Failed to open in-memory store"),
            _temp_dir: None,
        }
    }

    /// Creates a new store in a temporary root directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open_at(temp_dir.path(), TEST_STORE).expect("Failed to open file store");
        Self {
            store,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Creates an in-memory store whose writes can be made to fail.
    pub fn faulty() -> (Self, FaultInjector) {
        let injector = FaultInjector::new();
        let inner = SqliteBackend::open_in_memory().expect("Failed to open in-memory backend");
        let backend = FaultyBackend::new(Box::new(inner), injector.clone());
        let store = Store::open_with_backend(
            TEST_STORE,
            Box::new(backend),
            Arc::new(AvailabilitySignal::new()),
        )
        .expect("Failed to open faulty store");
        (
            Self {
                store,
                _temp_dir: None,
            },
            injector,
        )
    }

    /// Returns the store directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().join(TEST_STORE))
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// A store registry rooted in a temporary directory.
pub struct TestRegistry {
    /// The registry instance.
    pub registry: StoreRegistry,
    temp_dir: TempDir,
}

impl TestRegistry {
    /// Creates a registry with default settings under a fresh temp root.
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Creates a registry, letting the caller adjust the configuration.
    pub fn with_config(adjust: impl FnOnce(StoreConfig) -> StoreConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let registry = StoreRegistry::new(adjust(StoreConfig::new(temp_dir.path())));
        Self { registry, temp_dir }
    }

    /// Root directory of every store in this registry.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Closes every store and opens a fresh registry over the same root.
    ///
    /// Simulates a process restart.
    pub fn restart(&mut self) {
        self.registry.close_all();
        self.registry = StoreRegistry::new(self.registry.config().clone());
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestRegistry {
    type Target = StoreRegistry;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use soupdb_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     assert!(store.soup_names().unwrap().is_empty());
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a store in a temporary directory.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store, &Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store.path().expect("File store should have a path");
    f(&test_store.store, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use soupdb_codec::Value;
    use soupdb_core::{IndexSpec, SoupEntryId, SOUP_ENTRY_ID};

    /// Soup used by the people scenario.
    pub const PEOPLE: &str = "people";

    /// Builds a person document.
    pub fn person(first_name: &str, last_name: &str) -> Value {
        Value::from(serde_json::json!({
            "firstName": first_name,
            "lastName": last_name,
        }))
    }

    /// Index specs of the people soup.
    pub fn people_specs() -> Vec<IndexSpec> {
        vec![IndexSpec::string("lastName")]
    }

    /// Creates an in-memory store with an empty people soup.
    pub fn people_store() -> TestStore {
        let store = TestStore::memory();
        store
            .register_soup(PEOPLE, &people_specs())
            .expect("Failed to register people soup");
        store
    }

    /// Creates a people store holding Ada Lovelace and Alan Turing.
    pub fn populated_people_store() -> (TestStore, Vec<Value>) {
        let store = people_store();
        let stored = store
            .upsert_entries(
                PEOPLE,
                vec![person("Ada", "Lovelace"), person("Alan", "Turing")],
                None,
            )
            .expect("Failed to upsert people");
        (store, stored)
    }

    /// Reads the entry id embedded in a stored document.
    pub fn entry_id(document: &Value) -> SoupEntryId {
        let id = document
            .get(SOUP_ENTRY_ID)
            .and_then(Value::as_integer)
            .expect("Document should carry an entry id");
        SoupEntryId::new(id)
    }
}
