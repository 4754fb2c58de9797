//! The local entity store.
//!
//! Each record lives in its own directory under the store root, keyed by
//! the server identifier when assigned and by the locally generated uid
//! otherwise. The directory holds a single YAML descriptor file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

use fedreg_core::TrainingRecord;

/// Name of the descriptor file inside each record directory.
pub const TRAINING_FILE: &str = "training.yaml";

/// Error returned by the [`LocalStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no training with key `{0}` exists locally")]
    NotFound(String),

    #[error("reading or writing a training failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize a training descriptor: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// An on-disk cache of training descriptors.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Creates a store rooted at the given directory. The directory is
    /// created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory a record with the given key lives in.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn descriptor(&self, key: &str) -> PathBuf {
        self.path_for(key).join(TRAINING_FILE)
    }

    /// Serializes the record into its per-identifier directory, creating
    /// it if absent. Returns the path of the descriptor file.
    pub fn write(&self, record: &TrainingRecord) -> Result<PathBuf, StoreError> {
        let dir = self.path_for(&record.storage_key());
        fs::create_dir_all(&dir)?;
        let file = dir.join(TRAINING_FILE);
        fs::write(&file, serde_yaml::to_string(record)?)?;
        Ok(file)
    }

    /// Reads the record stored under the given key.
    ///
    /// # Errors
    /// Fails with [`StoreError::NotFound`] when no descriptor file
    /// exists for the key.
    pub fn read(&self, key: &str) -> Result<TrainingRecord, StoreError> {
        let file = self.descriptor(key);
        if !file.exists() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        Ok(serde_yaml::from_str(&fs::read_to_string(file)?)?)
    }

    /// Enumerates all locally cached records.
    ///
    /// Entries that fail to parse are logged and skipped; an unreadable
    /// store root degrades to an empty result.
    pub fn list(&self) -> Vec<TrainingRecord> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("couldn't iterate over the trainings directory: {}", e);
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) if entry.path().is_dir() => entry,
                Ok(_) => continue,
                Err(e) => {
                    warn!("couldn't read a trainings directory entry: {}", e);
                    continue;
                }
            };
            let key = entry.file_name().to_string_lossy().into_owned();
            match self.read(&key) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping unreadable training `{}`: {}", key, e),
            }
        }
        records
    }

    /// Removes the record directory for the given key. Removing an
    /// absent entry is not an error.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let dir = self.path_for(key);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    /// Moves a cache entry to a new key: any existing entry at the
    /// destination is removed first, then the directory is renamed.
    pub fn relocate(&self, old_key: &str, new_key: &str) -> Result<(), StoreError> {
        self.remove(new_key)?;
        fs::rename(self.path_for(old_key), self.path_for(new_key))?;
        Ok(())
    }
}
