//! # SoupDB Core
//!
//! Embedded document store for SoupDB.
//!
//! This crate provides:
//! - Named stores, one per directory, handed out by a [`StoreRegistry`]
//! - Soups: document collections with declared [`IndexSpec`]s
//! - Upserts by soup entry id or by external id path
//! - Exact, range and `LIKE` queries with ordering and paging
//! - [`SoupCursor`] for walking large result sets page by page
//!
//! Documents are [`soupdb_codec::Value`] trees, stored as JSON in a
//! relational backend from [`soupdb_storage`]. Each index spec becomes a
//! typed column kept in step with the document on every write.
//!
//! ## Example
//!
//! ```rust
//! use soupdb_core::{IndexSpec, QuerySpec, SortOrder, Store};
//! use soupdb_codec::Value;
//!
//! let store = Store::open_in_memory("example").unwrap();
//! store
//!     .register_soup("people", &[IndexSpec::string("lastName"), IndexSpec::integer("age")])
//!     .unwrap();
//!
//! let people = vec![
//!     Value::map([("lastName", Value::from("Lovelace")), ("age", Value::from(36))]),
//!     Value::map([("lastName", Value::from("Turing")), ("age", Value::from(41))]),
//! ];
//! store.upsert_entries("people", people, None).unwrap();
//!
//! let spec = QuerySpec::range("age", Some(30.into()), None, 10)
//!     .order_by("age", SortOrder::Descending);
//! let page = store.query("people", &spec, 0).unwrap();
//! assert_eq!(page[0].get("lastName"), Some(&Value::from("Turing")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Version of the core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod availability;
mod config;
mod cursor;
mod dir;
mod entry;
mod error;
mod index;
mod query;
mod row;
mod soup;
mod store;
mod store_registry;
mod types;

pub use availability::{AvailabilityEvent, AvailabilitySignal};
pub use config::{StoreConfig, DEFAULT_PAGE_SIZE};
pub use cursor::SoupCursor;
pub use dir::validate_store_name;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use index::{coerce, columns_for, validate_specs, IndexColumn, IndexSpec, IndexType};
pub use query::{QueryKind, QuerySpec, SortOrder};
pub use soup::Soup;
pub use store::Store;
pub use store_registry::StoreRegistry;
pub use types::{
    EntryTimestamps, SoupEntryId, SOUP_CREATED_DATE, SOUP_ENTRY_ID, SOUP_LAST_MODIFIED_DATE,
};
