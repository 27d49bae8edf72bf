//! Store directory management.
//!
//! Each persistent store owns one directory under the registry root:
//!
//! ```text
//! <root>/<store name>/
//! ├─ LOCK              # Advisory lock, one open handle per store
//! ├─ store.sqlite      # Relational database holding every soup
//! ├─ store.sqlite-wal  # Write-ahead log (WAL journaling only)
//! └─ store.sqlite-shm
//! ```

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const DB_FILE: &str = "store.sqlite";
const LOCK_FILE: &str = "LOCK";

/// Checks that a store name can be used as a directory name.
///
/// # Errors
///
/// Returns a validation error for empty names, `.`/`..`, and names containing
/// path separators or NUL.
pub fn validate_store_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::validation("store name is empty"));
    }
    if name == "." || name == ".." {
        return Err(CoreError::validation(format!(
            "store name {name:?} is reserved"
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(CoreError::validation(format!(
            "store name {name:?} contains a path separator"
        )));
    }
    Ok(())
}

/// Holds a store directory open with an exclusive lock.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct StoreDir {
    path: PathBuf,
    _lock_file: File,
}

impl StoreDir {
    /// Opens or creates a store directory and takes its lock.
    ///
    /// # Errors
    ///
    /// - `StoreNotFound` if the directory holds no database and
    ///   `create_if_missing` is false
    /// - `StoreLocked` if another handle holds the lock
    /// - I/O errors
    pub fn open(name: &str, path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !Self::exists(path) {
            if !create_if_missing {
                return Err(CoreError::StoreNotFound {
                    name: name.to_string(),
                });
            }
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StoreLocked {
                name: name.to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the database file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.path.join(DB_FILE)
    }

    /// True when `path` holds a store database file.
    #[must_use]
    pub fn exists(path: &Path) -> bool {
        path.join(DB_FILE).is_file()
    }

    /// Deletes a store directory and everything in it.
    ///
    /// Missing directories are not an error.
    pub fn remove(path: &Path) -> CoreResult<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
