//! Cart storage backends

use std::{
    fs,
    io::{self, ErrorKind},
    path::PathBuf,
};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading a key failed.
    #[error("failed to read {key}")]
    Read {
        /// Key being read.
        key: String,

        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Writing or removing a key failed.
    #[error("failed to write {key}")]
    Write {
        /// Key being written.
        key: String,

        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A value could not be encoded.
    #[error("failed to encode {key}")]
    Encode {
        /// Key being encoded.
        key: String,

        /// Underlying encoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key/value storage for cart state.
pub trait CartStorage {
    /// Read a key; `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] when the backend cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace a key's value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] when the backend cannot be written.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Unset a key. Removing an unset key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] when the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: FxHashMap<String, String>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);

        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens a storage directory, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] when the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();

        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            key: dir.display().to_string(),
            source,
        })?;

        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CartStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let target = self.path(key);
        let staging = self.dir.join(format!("{key}.json.tmp"));

        fs::write(&staging, value)
            .and_then(|()| fs::rename(&staging, &target))
            .map_err(|source| StorageError::Write {
                key: key.to_string(),
                source,
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn memory_storage_round_trips_values() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.save("cart_items", "[]")?;

        assert_eq!(storage.load("cart_items")?.as_deref(), Some("[]"));

        storage.remove("cart_items")?;

        assert_eq!(storage.load("cart_items")?, None);

        Ok(())
    }

    #[test]
    fn file_storage_missing_key_is_unset() -> TestResult {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::open(dir.path())?;

        assert_eq!(storage.load("payment_method")?, None);

        Ok(())
    }

    #[test]
    fn file_storage_overwrites_values() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::open(dir.path().join("cart"))?;

        storage.save("payment_method", "first")?;
        storage.save("payment_method", "second")?;

        assert_eq!(storage.load("payment_method")?.as_deref(), Some("second"));
        assert!(
            !dir.path().join("cart/payment_method.json.tmp").exists(),
            "staging file should be renamed away"
        );

        Ok(())
    }

    #[test]
    fn file_storage_remove_is_idempotent() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::open(dir.path())?;

        storage.save("shipping_address", "{}")?;
        storage.remove("shipping_address")?;
        storage.remove("shipping_address")?;

        assert_eq!(storage.load("shipping_address")?, None);

        Ok(())
    }
}
