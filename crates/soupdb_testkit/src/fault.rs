//! Fault injection for atomicity testing.
//!
//! [`FaultyBackend`] wraps a real backend and fails a chosen write
//! statement. Tests use it to check that a multi-statement operation which
//! fails halfway leaves nothing behind.
//!
//! ## Usage
//!
//! ```rust
//! use soupdb_testkit::fault::{FaultInjector, FaultyBackend};
//! use soupdb_storage::{SqlBackend, SqliteBackend};
//!
//! let injector = FaultInjector::new();
//! let mut backend =
//!     FaultyBackend::new(Box::new(SqliteBackend::open_in_memory().unwrap()), injector.clone());
//!
//! injector.fail_nth_write(2);
//! backend.execute("CREATE TABLE a (v)", &[]).unwrap();
//! assert!(backend.execute("CREATE TABLE b (v)", &[]).is_err());
//! assert!(injector.has_tripped());
//! ```

use soupdb_storage::{Row, SqlBackend, SqlValue, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared control handle for a [`FaultyBackend`].
///
/// The handle stays with the test while the backend moves into a store.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    inner: Arc<InjectorState>,
}

#[derive(Debug, Default)]
struct InjectorState {
    armed: AtomicBool,
    fail_at: AtomicUsize,
    writes: AtomicUsize,
    tripped: AtomicBool,
}

impl FaultInjector {
    /// Creates a disarmed injector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the `n`-th write statement from now on (1-based).
    ///
    /// Only that one statement fails; later writes pass again.
    pub fn fail_nth_write(&self, n: usize) {
        self.inner.writes.store(0, Ordering::SeqCst);
        self.inner.fail_at.store(n, Ordering::SeqCst);
        self.inner.tripped.store(false, Ordering::SeqCst);
        self.inner.armed.store(true, Ordering::SeqCst);
    }

    /// Disarms the injector and clears its counters.
    pub fn reset(&self) {
        self.inner.armed.store(false, Ordering::SeqCst);
        self.inner.writes.store(0, Ordering::SeqCst);
        self.inner.tripped.store(false, Ordering::SeqCst);
    }

    /// Returns whether a fault has been injected since the last arm.
    pub fn has_tripped(&self) -> bool {
        self.inner.tripped.load(Ordering::SeqCst)
    }

    /// Write statements seen since the last arm.
    pub fn writes_seen(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn on_write(&self) -> StorageResult<()> {
        if !self.inner.armed.load(Ordering::SeqCst) {
            return Ok(());
        }
        let seen = self.inner.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if seen == self.inner.fail_at.load(Ordering::SeqCst) {
            self.inner.tripped.store(true, Ordering::SeqCst);
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected fault",
            )));
        }
        Ok(())
    }
}

/// A backend wrapper that fails writes on command.
///
/// Reads and transaction control always reach the inner backend, so a
/// failed write can still be rolled back.
pub struct FaultyBackend {
    inner: Box<dyn SqlBackend>,
    injector: FaultInjector,
}

impl FaultyBackend {
    /// Wraps `inner`, controlled by `injector`.
    pub fn new(inner: Box<dyn SqlBackend>, injector: FaultInjector) -> Self {
        Self { inner, injector }
    }
}

impl SqlBackend for FaultyBackend {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<usize> {
        self.injector.on_write()?;
        self.inner.execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<Vec<Row>> {
        self.inner.query(sql, params)
    }

    fn begin(&mut self) -> StorageResult<()> {
        self.inner.begin()
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> StorageResult<()> {
        self.inner.rollback()
    }

    fn last_inserted_id(&self) -> i64 {
        self.inner.last_inserted_id()
    }

    fn table_exists(&mut self, name: &str) -> StorageResult<bool> {
        self.inner.table_exists(name)
    }

    fn in_transaction(&self) -> bool {
        self.inner.in_transaction()
    }
}
