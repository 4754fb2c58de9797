//! Storage for training records.

use async_trait::async_trait;

use fedreg_core::TrainingRecord;

pub mod memory;
pub use self::memory::MemoryStorage;

#[cfg(test)]
mod tests;

/// The error type for storage operations that are not related to the
/// application domain, for example a lost backend connection.
pub type StorageError = anyhow::Error;

/// The result of a storage operation.
pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
/// An abstract store of training records.
///
/// Each call runs in its own transaction scope; two conflicting updates to
/// the same record are last-write-wins.
pub trait TrainingStorage
where
    Self: Clone + Send + Sync + 'static,
{
    /// Inserts a new record and assigns the next free identifier.
    ///
    /// # Behavior
    ///
    /// - Returns the stored record with its `id` set.
    async fn create(&mut self, record: TrainingRecord) -> StorageResult<TrainingRecord>;

    /// Returns the record with the given identifier.
    ///
    /// # Behavior
    ///
    /// - If no such record exists, return `StorageResult::Ok(None)`.
    async fn get(&mut self, id: u64) -> StorageResult<Option<TrainingRecord>>;

    /// Returns all records, ordered by identifier.
    async fn list(&mut self) -> StorageResult<Vec<TrainingRecord>>;

    /// Returns the records owned by the given user, ordered by identifier.
    async fn list_by_owner(&mut self, owner: u64) -> StorageResult<Vec<TrainingRecord>>;

    /// Whether the given user owns a record that is still pending.
    async fn has_pending(&mut self, owner: u64) -> StorageResult<bool>;

    /// Replaces the stored version of `record`.
    ///
    /// # Behavior
    ///
    /// - Returns `false` when no record with that identifier exists.
    async fn update(&mut self, record: &TrainingRecord) -> StorageResult<bool>;

    /// Deletes the record with the given identifier.
    ///
    /// # Behavior
    ///
    /// - Returns `false` when no record with that identifier exists.
    async fn delete(&mut self, id: u64) -> StorageResult<bool>;
}
