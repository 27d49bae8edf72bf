//! Store configuration.

use soupdb_storage::SqliteOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of entries per query page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Configuration shared by every store a registry opens.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory under which each store gets `<root_dir>/<name>/`.
    pub root_dir: PathBuf,

    /// Whether to create a store that does not exist yet.
    pub create_if_missing: bool,

    /// How long a statement waits on a locked database file.
    pub busy_timeout: Duration,

    /// Whether store files use write-ahead-log journaling.
    pub journal_mode_wal: bool,

    /// Page size for query dictionaries that do not name one.
    pub default_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("stores"),
            create_if_missing: true,
            busy_timeout: Duration::from_secs(5),
            journal_mode_wal: true,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration rooted at the given directory.
    #[must_use]
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Sets the root directory.
    #[must_use]
    pub fn root_dir(mut self, root_dir: impl AsRef<Path>) -> Self {
        self.root_dir = root_dir.as_ref().to_path_buf();
        self
    }

    /// Sets whether to create missing stores.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the busy timeout.
    #[must_use]
    pub const fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to use write-ahead-log journaling.
    #[must_use]
    pub const fn journal_mode_wal(mut self, value: bool) -> Self {
        self.journal_mode_wal = value;
        self
    }

    /// Sets the default page size. Zero is replaced by [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub const fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = if size == 0 { DEFAULT_PAGE_SIZE } else { size };
        self
    }

    pub(crate) fn sqlite_options(&self) -> SqliteOptions {
        SqliteOptions {
            busy_timeout: self.busy_timeout,
            journal_mode_wal: self.journal_mode_wal,
        }
    }
}
