//! Error types for SoupDB core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad category of a [`CoreError`].
///
/// Callers that only need to decide between "fix the request", "retry
/// later" and "give up" can match on this instead of every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is malformed.
    Validation,
    /// The named soup or store does not exist.
    NotFound,
    /// The request contradicts existing definitions.
    Conflict,
    /// An external-id lookup matched more than one entry.
    AmbiguousMatch,
    /// The storage layer failed.
    Backend,
    /// The store is closed, removed or held by someone else.
    State,
}

/// Errors that can occur in SoupDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] soupdb_storage::StorageError),

    /// Document codec error.
    #[error("codec error: {0}")]
    Codec(#[from] soupdb_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed request.
    #[error("validation failed: {message}")]
    Validation {
        /// What is wrong with the request.
        message: String,
    },

    /// Soup not found.
    #[error("soup not found: {name}")]
    SoupNotFound {
        /// Name of the soup.
        name: String,
    },

    /// Store not found.
    #[error("store not found: {name}")]
    StoreNotFound {
        /// Name of the store.
        name: String,
    },

    /// Soup re-registered with different index specs.
    #[error("conflict on soup {soup}: {message}")]
    Conflict {
        /// Name of the soup.
        soup: String,
        /// Description of the conflict.
        message: String,
    },

    /// External id matched several entries.
    #[error("external id {path} matched {matches} entries in soup {soup}")]
    AmbiguousMatch {
        /// Name of the soup.
        soup: String,
        /// The external id path.
        path: String,
        /// How many entries matched (at least two).
        matches: usize,
    },

    /// Persisted metadata or documents could not be read back.
    #[error("invalid store format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Store is closed.
    #[error("store is closed: {name}")]
    StoreClosed {
        /// Name of the store.
        name: String,
    },

    /// Store directory is locked by another handle or process.
    #[error("store locked: {name} is already open elsewhere")]
    StoreLocked {
        /// Name of the store.
        name: String,
    },
}

impl CoreError {
    /// Returns the broad category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::Codec(_) => ErrorKind::Validation,
            Self::SoupNotFound { .. } | Self::StoreNotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::AmbiguousMatch { .. } => ErrorKind::AmbiguousMatch,
            Self::Storage(_) | Self::Io(_) | Self::InvalidFormat { .. } => ErrorKind::Backend,
            Self::StoreClosed { .. } | Self::StoreLocked { .. } => ErrorKind::State,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a soup not found error.
    pub fn soup_not_found(name: impl Into<String>) -> Self {
        Self::SoupNotFound { name: name.into() }
    }

    /// Creates a conflict error.
    pub fn conflict(soup: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            soup: soup.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a store closed error.
    pub fn store_closed(name: impl Into<String>) -> Self {
        Self::StoreClosed { name: name.into() }
    }
}
