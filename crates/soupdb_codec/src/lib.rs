//! # SoupDB Codec
//!
//! Document codec for SoupDB.
//!
//! This crate turns JSON text into a tree of typed values and back, and
//! defines how a path addresses a value inside that tree:
//!
//! - [`Value`] - null, boolean, integer, float, string, array or object
//! - [`decode`] / [`encode`] - JSON text conversion through `serde_json`
//! - [`DocPath`] - dotted (`a.b`) or slashed (`a/b`) path segments
//!
//! ## Usage
//!
//! ```
//! use soupdb_codec::{decode, encode, DocPath, Value};
//!
//! let doc = decode(r#"{"address": {"city": "London"}}"#).unwrap();
//! let city = DocPath::parse("address.city").unwrap();
//! assert_eq!(doc.at(&city), Some(&Value::from("London")));
//!
//! let text = encode(&doc).unwrap();
//! assert_eq!(decode(&text).unwrap(), doc);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;
mod path;
mod value;

pub use error::{CodecError, CodecResult};
pub use json::{decode, encode, encode_pretty};
pub use path::DocPath;
pub use value::Value;

/// Resolves a path in a document, parsing the path first.
///
/// Returns `Ok(None)` when the path is well-formed but does not resolve.
///
/// # Errors
///
/// Returns `InvalidPath` if the path cannot be parsed.
pub fn value_at<'a>(document: &'a Value, path: &str) -> CodecResult<Option<&'a Value>> {
    let path = DocPath::parse(path)?;
    Ok(document.at(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_at_resolves_and_misses() {
        let doc = decode(r#"{"a": {"b": [10, 20]}}"#).unwrap();
        assert_eq!(value_at(&doc, "a.b.1").unwrap(), Some(&Value::Integer(20)));
        assert_eq!(value_at(&doc, "a/c").unwrap(), None);
        assert!(value_at(&doc, "a..b").is_err());
    }
}
