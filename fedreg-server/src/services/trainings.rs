use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use crate::storage::{StorageError, TrainingStorage};
use fedreg_core::{apply_update, ApprovalStatus, SchemaError, TrainingRecord, UpdateError, UpdatePatch};

/// The authenticated originator of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: u64,
    pub admin: bool,
}

/// An error returned by the [`TrainingService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("training {0} not found")]
    NotFound(u64),

    #[error("user already owns a pending training")]
    DuplicatePending,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("the requester is not allowed to perform this operation")]
    Forbidden,

    #[error("storage failure: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Request handling for the training endpoints.
#[derive(Clone)]
pub struct TrainingService<S> {
    storage: S,
    admins: HashSet<u64>,
}

impl<S> TrainingService<S>
where
    S: TrainingStorage,
{
    pub fn new(storage: S, admins: impl IntoIterator<Item = u64>) -> Self {
        Self {
            storage,
            admins: admins.into_iter().collect(),
        }
    }

    /// Resolves a user identifier into a [`Requester`].
    pub fn requester(&self, id: u64) -> Requester {
        Requester {
            id,
            admin: self.admins.contains(&id),
        }
    }

    /// Registers a new training owned by the requester.
    ///
    /// The registry assigns the identifier, the owner and the creation
    /// timestamp; whatever the draft carried in those fields is
    /// discarded. Every new record starts out pending.
    ///
    /// # Errors
    /// Fails when the draft violates the schema rules or the requester
    /// already owns a pending training.
    pub async fn create(
        &mut self,
        requester: Requester,
        mut draft: TrainingRecord,
    ) -> Result<TrainingRecord, ServiceError> {
        draft.validate()?;
        if self.storage.has_pending(requester.id).await? {
            return Err(ServiceError::DuplicatePending);
        }

        let now = Utc::now();
        draft.id = None;
        draft.owner = Some(requester.id);
        draft.approval_status = ApprovalStatus::Pending;
        draft.approved_at = None;
        draft.created_at = Some(now);
        draft.modified_at = Some(now);

        let record = self.storage.create(draft).await?;
        info!(id = ?record.id, owner = requester.id, "registered new training");
        Ok(record)
    }

    pub async fn get(&mut self, id: u64) -> Result<TrainingRecord, ServiceError> {
        self.storage
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn list(&mut self) -> Result<Vec<TrainingRecord>, ServiceError> {
        Ok(self.storage.list().await?)
    }

    pub async fn list_mine(
        &mut self,
        requester: Requester,
    ) -> Result<Vec<TrainingRecord>, ServiceError> {
        Ok(self.storage.list_by_owner(requester.id).await?)
    }

    /// Applies a partial update through the approval state machine.
    ///
    /// Approval decisions are reserved to admins; any other update may
    /// come from the owner or an admin.
    pub async fn update(
        &mut self,
        requester: Requester,
        id: u64,
        patch: UpdatePatch,
    ) -> Result<TrainingRecord, ServiceError> {
        let stored = self.get(id).await?;
        if patch.approval_status.is_some() {
            if !requester.admin {
                return Err(ServiceError::Forbidden);
            }
        } else if !requester.admin && stored.owner != Some(requester.id) {
            return Err(ServiceError::Forbidden);
        }

        let updated = apply_update(&stored, &patch, Utc::now())?;
        if !self.storage.update(&updated).await? {
            return Err(ServiceError::NotFound(id));
        }
        info!(id, status = %updated.approval_status, "updated training");
        Ok(updated)
    }

    /// Removes a record. Admins only.
    pub async fn delete(&mut self, requester: Requester, id: u64) -> Result<(), ServiceError> {
        if !requester.admin {
            return Err(ServiceError::Forbidden);
        }
        if !self.storage.delete(id).await? {
            return Err(ServiceError::NotFound(id));
        }
        info!(id, "deleted training");
        Ok(())
    }
}
