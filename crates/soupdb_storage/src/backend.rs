//! Backend capability trait definition.

use crate::error::StorageResult;
use crate::value::SqlValue;

/// One result row, columns in statement order.
pub type Row = Vec<SqlValue>;

/// The relational capability SoupDB is built on.
///
/// A backend owns one connection. SoupDB decides what tables exist and what
/// the statements mean; the backend only executes them.
///
/// # Invariants
///
/// - `execute` returns the number of rows changed by the statement
/// - `last_inserted_id` reports the row id of the most recent successful insert
///   on this connection
/// - `begin`/`commit`/`rollback` bracket a single, non-nested transaction
/// - DDL issued inside a transaction is rolled back with it
///
/// # Implementors
///
/// - [`super::SqliteBackend`] - SQLite through `rusqlite`
pub trait SqlBackend: Send {
    /// Executes a statement that does not return rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<usize>;

    /// Executes a statement and collects every result row.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be prepared or executed.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<Vec<Row>>;

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction is already active or the engine
    /// refuses to start one.
    fn begin(&mut self) -> StorageResult<()>;

    /// Commits the active transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no active transaction or the commit fails.
    fn commit(&mut self) -> StorageResult<()>;

    /// Rolls back the active transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no active transaction.
    fn rollback(&mut self) -> StorageResult<()>;

    /// Returns the row id assigned by the most recent insert.
    fn last_inserted_id(&self) -> i64;

    /// Checks whether a table with the given name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn table_exists(&mut self, name: &str) -> StorageResult<bool>;

    /// Returns true while a transaction is open.
    fn in_transaction(&self) -> bool;
}

impl<B: SqlBackend + ?Sized> SqlBackend for Box<B> {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<usize> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn begin(&mut self) -> StorageResult<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> StorageResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> StorageResult<()> {
        (**self).rollback()
    }

    fn last_inserted_id(&self) -> i64 {
        (**self).last_inserted_id()
    }

    fn table_exists(&mut self, name: &str) -> StorageResult<bool> {
        (**self).table_exists(name)
    }

    fn in_transaction(&self) -> bool {
        (**self).in_transaction()
    }
}
