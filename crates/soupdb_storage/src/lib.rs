//! # SoupDB Storage
//!
//! Relational backend adapter for SoupDB.
//!
//! This crate is the lowest layer of SoupDB. It exposes the relational
//! engine as a narrow capability: execute a statement, read rows, run a
//! transaction, ask for the last inserted row id and check whether a table
//! exists. Backends do not know anything about soups, documents or indexes.
//!
//! ## Design Principles
//!
//! - Backends execute SQL with positional parameters and return plain rows
//! - One backend owns exactly one connection
//! - Backends must be `Send` so a store can move them behind a lock
//! - Multi-statement writes go through the scoped [`Transaction`] guard
//!
//! ## Available Backends
//!
//! - [`SqliteBackend`] - SQLite through `rusqlite`, on disk or in memory
//!
//! ## Example
//!
//! ```rust
//! use soupdb_storage::{SqlBackend, SqliteBackend, SqlValue, Transaction};
//!
//! let mut backend = SqliteBackend::open_in_memory().unwrap();
//! backend.execute("CREATE TABLE t (v TEXT)", &[]).unwrap();
//!
//! let mut txn = Transaction::begin(&mut backend).unwrap();
//! txn.execute("INSERT INTO t (v) VALUES (?)", &[SqlValue::from("hello")])
//!     .unwrap();
//! txn.commit().unwrap();
//!
//! let rows = backend.query("SELECT v FROM t", &[]).unwrap();
//! assert_eq!(rows[0][0], SqlValue::from("hello"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod sqlite;
mod transaction;
mod value;

pub use backend::{Row, SqlBackend};
pub use error::{StorageError, StorageResult};
pub use sqlite::{SqliteBackend, SqliteOptions};
pub use transaction::Transaction;
pub use value::SqlValue;
