//! Scoped transaction guard.

use crate::backend::{Row, SqlBackend};
use crate::error::StorageResult;
use crate::value::SqlValue;

/// A transaction on a [`SqlBackend`] that rolls back unless committed.
///
/// The guard borrows the backend mutably for its whole lifetime, so no other
/// statement can run on the connection outside the transaction. Dropping the
/// guard without calling [`Transaction::commit`] (an early `?` return, a panic)
/// rolls the transaction back.
///
/// # Example
///
/// ```rust
/// use soupdb_storage::{SqlBackend, SqliteBackend, Transaction};
///
/// let mut backend = SqliteBackend::open_in_memory().unwrap();
/// {
///     let mut txn = Transaction::begin(&mut backend).unwrap();
///     txn.execute("CREATE TABLE t (v INTEGER)", &[]).unwrap();
///     // dropped here: rolled back
/// }
/// assert!(!backend.table_exists("t").unwrap());
/// ```
pub struct Transaction<'a, B: SqlBackend + ?Sized> {
    backend: &'a mut B,
    finished: bool,
}

impl<'a, B: SqlBackend + ?Sized> Transaction<'a, B> {
    /// Begins a transaction on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start a transaction.
    pub fn begin(backend: &'a mut B) -> StorageResult<Self> {
        backend.begin()?;
        Ok(Self {
            backend,
            finished: false,
        })
    }

    /// Executes a statement inside the transaction.
    pub fn execute(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<usize> {
        self.backend.execute(sql, params)
    }

    /// Runs a query inside the transaction.
    pub fn query(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<Vec<Row>> {
        self.backend.query(sql, params)
    }

    /// Returns the row id of the most recent insert.
    pub fn last_inserted_id(&self) -> i64 {
        self.backend.last_inserted_id()
    }

    /// Gives access to the underlying backend for helpers that take one.
    pub fn backend(&mut self) -> &mut B {
        self.backend
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails. The guard then rolls back on drop.
    pub fn commit(mut self) -> StorageResult<()> {
        self.backend.commit()?;
        self.finished = true;
        Ok(())
    }

    /// Rolls the transaction back explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub fn rollback(mut self) -> StorageResult<()> {
        self.finished = true;
        self.backend.rollback()
    }
}

impl<B: SqlBackend + ?Sized> Drop for Transaction<'_, B> {
    fn drop(&mut self) {
        if self.finished || !self.backend.in_transaction() {
            return;
        }
        if let Err(e) = self.backend.rollback() {
            tracing::warn!(target: "soupdb::storage", error = %e, "Rollback on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteBackend;

    fn backend_with_table() -> SqliteBackend {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", &[])
            .unwrap();
        backend
    }

    fn count(backend: &mut SqliteBackend) -> i64 {
        backend.query("SELECT COUNT(*) FROM t", &[]).unwrap()[0][0]
            .as_integer()
            .unwrap()
    }

    #[test]
    fn commit_persists() {
        let mut backend = backend_with_table();
        let mut txn = Transaction::begin(&mut backend).unwrap();
        txn.execute("INSERT INTO t (v) VALUES (?)", &[SqlValue::from("a")])
            .unwrap();
        assert_eq!(txn.last_inserted_id(), 1);
        txn.commit().unwrap();

        assert!(!backend.in_transaction());
        assert_eq!(count(&mut backend), 1);
    }

    #[test]
    fn drop_rolls_back() {
        let mut backend = backend_with_table();
        {
            let mut txn = Transaction::begin(&mut backend).unwrap();
            txn.execute("INSERT INTO t (v) VALUES ('a')", &[]).unwrap();
        }
        assert!(!backend.in_transaction());
        assert_eq!(count(&mut backend), 0);
    }

    #[test]
    fn early_return_rolls_back() {
        fn failing(backend: &mut SqliteBackend) -> StorageResult<()> {
            let mut txn = Transaction::begin(backend)?;
            txn.execute("INSERT INTO t (v) VALUES ('a')", &[])?;
            txn.execute("INSERT INTO missing (v) VALUES ('b')", &[])?;
            txn.commit()
        }

        let mut backend = backend_with_table();
        assert!(failing(&mut backend).is_err());
        assert_eq!(count(&mut backend), 0);
    }

    #[test]
    fn explicit_rollback() {
        let mut backend = backend_with_table();
        let mut txn = Transaction::begin(&mut backend).unwrap();
        txn.execute("INSERT INTO t (v) VALUES ('a')", &[]).unwrap();
        txn.rollback().unwrap();
        assert_eq!(count(&mut backend), 0);
    }

    #[test]
    fn works_through_trait_object() {
        let mut boxed: Box<dyn SqlBackend> = Box::new(backend_with_table());
        let mut txn = Transaction::begin(boxed.as_mut()).unwrap();
        txn.backend()
            .execute("INSERT INTO t (v) VALUES ('a')", &[])
            .unwrap();
        txn.commit().unwrap();
        let rows = boxed.query("SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows, vec![vec![SqlValue::from("a")]]);
    }
}
