//! Document path addressing.

use crate::error::{CodecError, CodecResult};
use std::fmt;
use std::str::FromStr;

/// A parsed path into a document, such as `address.city` or `address/city`.
///
/// Segments are separated by `.` or `/`. Empty segments are rejected, so
/// `a..b`, `.a` and `a/` are all invalid, and so are segments containing `"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    raw: String,
    segments: Vec<String>,
}

impl DocPath {
    /// Parses a path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPath` for an empty path, an empty segment or a segment
    /// containing `"`.
    pub fn parse(raw: &str) -> CodecResult<Self> {
        if raw.is_empty() {
            return Err(CodecError::invalid_path(raw, "path is empty"));
        }

        let segments: Vec<String> = raw.split(['.', '/']).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(CodecError::invalid_path(raw, "path has an empty segment"));
        }
        if segments.iter().any(|s| s.contains('"')) {
            return Err(CodecError::invalid_path(raw, "path segments cannot contain '\"'"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path exactly as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The individual segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The path with every separator written as `.`.
    ///
    /// Two spellings of the same path, such as `a/b` and `a.b`, have the
    /// same canonical form.
    pub fn canonical(&self) -> String {
        self.segments.join(".")
    }

    /// True for single-segment paths.
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DocPath {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
