//! Core type definitions for SoupDB.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Reserved document field carrying the entry's soup entry id.
pub const SOUP_ENTRY_ID: &str = "_soupEntryId";

/// Virtual path for an entry's creation time (Unix millis).
pub const SOUP_CREATED_DATE: &str = "_soupCreatedDate";

/// Virtual path for an entry's last modification time (Unix millis).
pub const SOUP_LAST_MODIFIED_DATE: &str = "_soupLastModifiedDate";

/// Identifier of an entry within its soup.
///
/// Assigned by the backend on insert. Ids are never reused within a soup,
/// even after the entry is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SoupEntryId(pub i64);

impl SoupEntryId {
    /// Creates a soup entry id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SoupEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry:{}", self.0)
    }
}

impl From<i64> for SoupEntryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Engine-maintained timestamps of an entry, in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTimestamps {
    /// When the entry was inserted.
    pub created: i64,
    /// When the entry was last written.
    pub last_modified: i64,
}

/// Current time in Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
