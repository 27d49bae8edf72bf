//! SQLite backend built on `rusqlite`.

use crate::backend::{Row, SqlBackend};
use crate::error::{StorageError, StorageResult};
use crate::value::SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection options for [`SqliteBackend`].
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Whether to switch the database to write-ahead-log journaling.
    pub journal_mode_wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            journal_mode_wal: true,
        }
    }
}

/// A SQLite connection exposed as a [`SqlBackend`].
///
/// Statements are prepared through the connection's statement cache, so the
/// hot query and upsert paths do not re-parse SQL on every call.
///
/// # Example
///
/// ```rust
/// use soupdb_storage::{SqlBackend, SqliteBackend};
///
/// let mut backend = SqliteBackend::open_in_memory().unwrap();
/// backend.execute("CREATE TABLE t (v INTEGER)", &[]).unwrap();
/// assert!(backend.table_exists("t").unwrap());
/// ```
pub struct SqliteBackend {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Opens or creates a database file with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or configured.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_with_options(path, &SqliteOptions::default())
    }

    /// Opens or creates a database file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be opened.
    pub fn open_with_options(path: &Path, options: &SqliteOptions) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        if options.journal_mode_wal {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            if !mode.eq_ignore_ascii_case("wal") {
                tracing::warn!(
                    target: "soupdb::storage",
                    path = %path.display(),
                    mode = %mode,
                    "WAL journal mode not available"
                );
            }
        }

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// Data is lost when the backend is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Returns the database file path, or `None` for in-memory databases.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Closes the connection, reporting any error SQLite raises on close.
    ///
    /// # Errors
    ///
    /// Returns an error if outstanding statements prevent the close.
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, e)| StorageError::from(e))
    }
}

impl SqlBackend for SqliteBackend {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<usize> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> StorageResult<Vec<Row>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(SqlValue::from_value_ref(row.get_ref(i)?));
            }
            out.push(values);
        }
        Ok(out)
    }

    fn begin(&mut self) -> StorageResult<()> {
        if self.in_transaction() {
            return Err(StorageError::transaction_state(
                "transaction already active",
            ));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        if !self.in_transaction() {
            return Err(StorageError::transaction_state("no active transaction"));
        }
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> StorageResult<()> {
        if !self.in_transaction() {
            return Err(StorageError::transaction_state("no active transaction"));
        }
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn last_inserted_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    fn table_exists(&mut self, name: &str) -> StorageResult<bool> {
        let rows = self.query(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[SqlValue::from(name)],
        )?;
        Ok(rows
            .first()
            .and_then(|row| row.first())
            .and_then(SqlValue::as_integer)
            .unwrap_or(0)
            > 0)
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

impl fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .field("in_transaction", &self.in_transaction())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn execute_and_query() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .execute("CREATE TABLE t (a INTEGER, b REAL, c TEXT, d BLOB)", &[])
            .unwrap();
        let changed = backend
            .execute(
                "INSERT INTO t VALUES (?, ?, ?, ?)",
                &[
                    SqlValue::Integer(1),
                    SqlValue::Real(2.5),
                    SqlValue::from("three"),
                    SqlValue::Null,
                ],
            )
            .unwrap();
        assert_eq!(changed, 1);

        let rows = backend.query("SELECT a, b, c, d FROM t", &[]).unwrap();
        assert_eq!(
            rows,
            vec![vec![
                SqlValue::Integer(1),
                SqlValue::Real(2.5),
                SqlValue::from("three"),
                SqlValue::Null,
            ]]
        );
    }

    #[test]
    fn last_inserted_id_tracks_inserts() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT)", &[])
            .unwrap();
        backend.execute("INSERT INTO t (v) VALUES ('a')", &[]).unwrap();
        backend.execute("INSERT INTO t (v) VALUES ('b')", &[]).unwrap();
        assert_eq!(backend.last_inserted_id(), 2);
    }

    #[test]
    fn table_exists() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        assert!(!backend.table_exists("t").unwrap());
        backend.execute("CREATE TABLE t (v TEXT)", &[]).unwrap();
        assert!(backend.table_exists("t").unwrap());
    }

    #[test]
    fn transaction_state_checks() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        assert!(backend.commit().is_err());
        assert!(backend.rollback().is_err());

        backend.begin().unwrap();
        assert!(backend.in_transaction());
        assert!(matches!(
            backend.begin(),
            Err(StorageError::TransactionState(_))
        ));
        backend.rollback().unwrap();
        assert!(!backend.in_transaction());
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.sqlite");

        {
            let mut backend = SqliteBackend::open(&path).unwrap();
            backend.execute("CREATE TABLE t (v TEXT)", &[]).unwrap();
            backend.execute("INSERT INTO t VALUES ('kept')", &[]).unwrap();
            backend.close().unwrap();
        }

        let mut backend = SqliteBackend::open(&path).unwrap();
        assert_eq!(backend.path(), Some(path.as_path()));
        let rows = backend.query("SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows[0][0], SqlValue::from("kept"));
    }

    #[test]
    fn bad_sql_is_an_error() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        assert!(matches!(
            backend.execute("NOT SQL", &[]),
            Err(StorageError::Sqlite(_))
        ));
    }
}
