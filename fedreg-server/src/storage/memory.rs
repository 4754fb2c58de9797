//! An in-memory storage backend.
//!
//! Holds the whole record set behind a single `RwLock`. This is the
//! default backend; persistent backends plug in through the
//! [`TrainingStorage`] trait.

use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StorageResult, TrainingStorage};
use fedreg_core::{ApprovalStatus, TrainingRecord};

#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
    last_id: u64,
    records: HashMap<u64, TrainingRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrainingStorage for MemoryStorage {
    async fn create(&mut self, mut record: TrainingRecord) -> StorageResult<TrainingRecord> {
        let mut state = self.inner.write().await;
        state.last_id += 1;
        let id = state.last_id;
        record.id = Some(id);
        state.records.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&mut self, id: u64) -> StorageResult<Option<TrainingRecord>> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn list(&mut self) -> StorageResult<Vec<TrainingRecord>> {
        let state = self.inner.read().await;
        let mut records: Vec<_> = state.records.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn list_by_owner(&mut self, owner: u64) -> StorageResult<Vec<TrainingRecord>> {
        let state = self.inner.read().await;
        let mut records: Vec<_> = state
            .records
            .values()
            .filter(|record| record.owner == Some(owner))
            .cloned()
            .collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn has_pending(&mut self, owner: u64) -> StorageResult<bool> {
        let state = self.inner.read().await;
        Ok(state.records.values().any(|record| {
            record.owner == Some(owner) && record.approval_status == ApprovalStatus::Pending
        }))
    }

    async fn update(&mut self, record: &TrainingRecord) -> StorageResult<bool> {
        let id = record
            .id
            .ok_or_else(|| anyhow!("cannot update a record without an identifier"))?;
        let mut state = self.inner.write().await;
        match state.records.get_mut(&id) {
            Some(stored) => {
                *stored = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&mut self, id: u64) -> StorageResult<bool> {
        Ok(self.inner.write().await.records.remove(&id).is_some())
    }
}
