//! Index definitions and column projection.
//!
//! An index spec names a document path and a value type. Each spec becomes
//! one typed column of the soup's backing table, kept in sync with the
//! document on every write so that queries on that path run against the
//! column instead of the stored text.
//!
//! # Index Types
//!
//! - `string`: TEXT column, any scalar is stored as its text form
//! - `integer`: INTEGER column, integral numbers and numeric text
//! - `floating`: REAL column, any number and numeric text
//!
//! Values that cannot be coerced (containers, null, non-numeric text in a
//! numeric index) project to NULL.

mod projection;
mod spec;

pub use projection::{coerce, columns_for};
pub(crate) use spec::canonical_path;
pub use spec::{validate_specs, IndexColumn, IndexSpec, IndexType};
