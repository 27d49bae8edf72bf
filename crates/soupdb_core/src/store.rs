//! Store facade.

use crate::availability::AvailabilitySignal;
use crate::config::StoreConfig;
use crate::cursor::SoupCursor;
use crate::dir::{validate_store_name, StoreDir};
use crate::entry;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexSpec;
use crate::query::{self, QuerySpec};
use crate::soup::{Soup, SoupRegistry};
use crate::types::{EntryTimestamps, SoupEntryId};
use parking_lot::Mutex;
use soupdb_codec::Value;
use soupdb_storage::{SqlBackend, SqliteBackend};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

struct StoreState {
    backend: Box<dyn SqlBackend>,
    soups: SoupRegistry,
    /// Holds the directory lock. None for stores without a directory.
    _dir: Option<StoreDir>,
}

/// A named document store holding any number of soups.
///
/// All operations on a store are serialized: each one runs to completion,
/// including its transaction, before the next starts. A `Store` can be
/// shared across threads behind an `Arc`.
///
/// # Opening a Store
///
/// Stores are usually obtained from a
/// [`StoreRegistry`](crate::StoreRegistry), which hands out one instance
/// per name. For tests, use [`Store::open_in_memory`]:
///
/// ```rust
/// use soupdb_core::{IndexSpec, QuerySpec, Store};
/// use soupdb_codec::Value;
///
/// let store = Store::open_in_memory("scratch").unwrap();
/// store.register_soup("people", &[IndexSpec::string("lastName")]).unwrap();
///
/// let stored = store
///     .upsert_entries("people", vec![Value::map([("lastName", "Lovelace".into())])], None)
///     .unwrap();
/// assert!(stored[0].get("_soupEntryId").is_some());
///
/// let spec = QuerySpec::exact("lastName", "Lovelace", 10);
/// assert_eq!(store.count_entries("people", &spec).unwrap(), 1);
/// ```
pub struct Store {
    name: String,
    state: Mutex<Option<StoreState>>,
    availability: Arc<AvailabilitySignal>,
}

impl Store {
    /// Opens the store's directory under the configured root.
    ///
    /// # Errors
    ///
    /// - `StoreNotFound` if the store does not exist and
    ///   `create_if_missing` is false
    /// - `StoreLocked` if the store is open elsewhere
    pub fn open(
        name: &str,
        config: &StoreConfig,
        availability: Arc<AvailabilitySignal>,
    ) -> CoreResult<Self> {
        validate_store_name(name)?;
        let dir = StoreDir::open(name, &config.root_dir.join(name), config.create_if_missing)?;
        let backend = SqliteBackend::open_with_options(&dir.db_path(), &config.sqlite_options())?;
        info!(target: "soupdb::store", store = name, path = %dir.path().display(), "opening store");
        Self::from_parts(name, Box::new(backend), Some(dir), availability)
    }

    /// Opens `<root>/<name>` with default settings and no registry.
    pub fn open_at(root: &Path, name: &str) -> CoreResult<Self> {
        Self::open(
            name,
            &StoreConfig::new(root),
            Arc::new(AvailabilitySignal::new()),
        )
    }

    /// Opens a store backed by an in-memory database.
    pub fn open_in_memory(name: &str) -> CoreResult<Self> {
        let backend = SqliteBackend::open_in_memory()?;
        Self::open_with_backend(name, Box::new(backend), Arc::new(AvailabilitySignal::new()))
    }

    /// Opens a store on an arbitrary backend.
    ///
    /// Useful for fault injection and for hosts that manage the database
    /// file themselves.
    pub fn open_with_backend(
        name: &str,
        backend: Box<dyn SqlBackend>,
        availability: Arc<AvailabilitySignal>,
    ) -> CoreResult<Self> {
        validate_store_name(name)?;
        Self::from_parts(name, backend, None, availability)
    }

    fn from_parts(
        name: &str,
        mut backend: Box<dyn SqlBackend>,
        dir: Option<StoreDir>,
        availability: Arc<AvailabilitySignal>,
    ) -> CoreResult<Self> {
        let soups = SoupRegistry::load(backend.as_mut())?;
        info!(target: "soupdb::store", store = name, soups = soups.names().len(), "store opened");
        Ok(Self {
            name: name.to_string(),
            state: Mutex::new(Some(StoreState {
                backend,
                soups,
                _dir: dir,
            })),
            availability,
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StoreState) -> CoreResult<T>) -> CoreResult<T> {
        let mut guard = self.state.lock();
        let state = guard
            .as_mut()
            .ok_or_else(|| CoreError::store_closed(&self.name))?;
        f(state)
    }

    fn with_soup<T>(
        &self,
        soup: &str,
        f: impl FnOnce(&mut dyn SqlBackend, &Soup) -> CoreResult<T>,
    ) -> CoreResult<T> {
        self.with_state(|state| {
            let soup = state.soups.require(soup)?;
            f(state.backend.as_mut(), soup)
        })
    }

    /// Store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True until [`Store::close`] is called.
    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Closes the store, releasing its database and directory lock.
    ///
    /// Later operations fail with `StoreClosed`. Closing twice is a no-op.
    pub fn close(&self) {
        if self.state.lock().take().is_some() {
            info!(target: "soupdb::store", store = %self.name, "store closed");
        }
    }

    /// True if protected file storage is currently readable.
    pub fn is_file_data_protection_active(&self) -> bool {
        self.availability.is_available()
    }

    /// True if a soup with this name is registered.
    pub fn soup_exists(&self, soup: &str) -> CoreResult<bool> {
        self.with_state(|state| Ok(state.soups.exists(soup)))
    }

    /// Names of all registered soups, sorted.
    pub fn soup_names(&self) -> CoreResult<Vec<String>> {
        self.with_state(|state| Ok(state.soups.names()))
    }

    /// Registers a soup with its index specs.
    ///
    /// Registering again with the same specs, in any order, is a no-op.
    ///
    /// # Errors
    ///
    /// `Conflict` if the soup exists with different specs. Use
    /// [`Store::add_index`] and [`Store::remove_index`] to change them.
    pub fn register_soup(&self, soup: &str, specs: &[IndexSpec]) -> CoreResult<()> {
        self.with_state(|state| {
            state.soups.register(state.backend.as_mut(), soup, specs)?;
            Ok(())
        })
    }

    /// Index specs of a soup, in declaration order.
    pub fn indices_for_soup(&self, soup: &str) -> CoreResult<Vec<IndexSpec>> {
        self.with_state(|state| Ok(state.soups.require(soup)?.index_specs()))
    }

    /// Drops a soup and all of its entries. Unknown soups are ignored.
    pub fn remove_soup(&self, soup: &str) -> CoreResult<()> {
        self.with_state(|state| state.soups.remove(state.backend.as_mut(), soup))
    }

    /// Adds an index to a soup, backfilling it from existing entries.
    pub fn add_index(&self, soup: &str, spec: &IndexSpec) -> CoreResult<()> {
        self.with_state(|state| {
            state.soups.add_index(state.backend.as_mut(), soup, spec)?;
            Ok(())
        })
    }

    /// Removes the index on `path` from a soup.
    pub fn remove_index(&self, soup: &str, path: &str) -> CoreResult<()> {
        self.with_state(|state| {
            state.soups.remove_index(state.backend.as_mut(), soup, path)?;
            Ok(())
        })
    }

    /// Number of entries matching the query.
    pub fn count_entries(&self, soup: &str, spec: &QuerySpec) -> CoreResult<usize> {
        self.with_soup(soup, |backend, soup| query::count_entries(backend, soup, spec))
    }

    /// One page of entries matching the query. Pages past the end are empty.
    pub fn query(&self, soup: &str, spec: &QuerySpec, page_index: usize) -> CoreResult<Vec<Value>> {
        self.with_soup(soup, |backend, soup| {
            query::query_page(backend, soup, spec, page_index)
        })
    }

    /// Opens a paging cursor over the entries matching the query.
    ///
    /// The total is counted once, when the cursor is created.
    pub fn query_soup(&self, soup: &str, spec: &QuerySpec) -> CoreResult<SoupCursor<'_>> {
        let total = self.count_entries(soup, spec)?;
        Ok(SoupCursor::new(self, soup, spec.clone(), total))
    }

    /// Documents with the given entry ids, in request order. Unknown ids are
    /// skipped.
    pub fn retrieve_entries(&self, soup: &str, ids: &[SoupEntryId]) -> CoreResult<Vec<Value>> {
        self.with_soup(soup, |backend, soup| entry::retrieve(backend, soup, ids))
    }

    /// Inserts or updates documents, returning them with `_soupEntryId` set.
    ///
    /// A document whose `_soupEntryId` names an existing entry replaces it.
    /// Otherwise, when `external_id_path` is given, the document replaces the
    /// single entry with the same value at that path, or is inserted when
    /// there is none. The batch is atomic.
    ///
    /// # Errors
    ///
    /// - `Validation` for non-object documents or a missing external id
    /// - `AmbiguousMatch` if an external id matches more than one entry
    pub fn upsert_entries(
        &self,
        soup: &str,
        documents: Vec<Value>,
        external_id_path: Option<&str>,
    ) -> CoreResult<Vec<Value>> {
        self.with_soup(soup, |backend, soup| {
            entry::upsert(backend, soup, documents, external_id_path)
        })
    }

    /// Deletes entries by id. Unknown ids are ignored.
    pub fn remove_entries(&self, soup: &str, ids: &[SoupEntryId]) -> CoreResult<usize> {
        self.with_soup(soup, |backend, soup| entry::remove(backend, soup, ids))
    }

    /// Created and last-modified times of an entry.
    pub fn entry_timestamps(
        &self,
        soup: &str,
        id: SoupEntryId,
    ) -> CoreResult<Option<EntryTimestamps>> {
        self.with_soup(soup, |backend, soup| entry::timestamps(backend, soup, id))
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}
