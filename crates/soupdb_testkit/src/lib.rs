//! # SoupDB Testkit
//!
//! Test utilities for SoupDB.
//!
//! This crate provides:
//! - Test fixtures: in-memory and temp-dir stores, temp-dir registries
//! - Property-based test generators using proptest
//! - A fault-injecting backend for atomicity tests
//!
//! ## Usage
//!
//! ```rust
//! use soupdb_testkit::prelude::*;
//!
//! with_temp_store(|store| {
//!     store.register_soup("people", &[]).unwrap();
//!     assert!(store.soup_exists("people").unwrap());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fault;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fault::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fault::*;
pub use fixtures::*;
pub use generators::*;
