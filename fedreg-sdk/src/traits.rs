use async_trait::async_trait;

use crate::client::ClientError;
use fedreg_core::{TrainingRecord, UpdatePatch};

/// A client for the Fedreg registry.
///
/// The concrete implementation is [`Client`]; workflows such as
/// [`Submission`] and the [`fetch`] functions are generic over this trait
/// so they can be exercised against a mock.
///
/// [`Client`]: crate::client::Client
/// [`Submission`]: crate::submit::Submission
/// [`fetch`]: crate::fetch
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryClient {
    /// The identifier of the user this client authenticates as, if any.
    fn user_id(&self) -> Option<u64>;

    /// Registers a draft and returns the canonical record, with the
    /// server-assigned identifier, owner and timestamps filled in.
    async fn create(&mut self, draft: &TrainingRecord) -> Result<TrainingRecord, ClientError>;

    /// Retrieves a single record.
    async fn get(&mut self, id: u64) -> Result<TrainingRecord, ClientError>;

    /// Retrieves all records.
    async fn list(&mut self) -> Result<Vec<TrainingRecord>, ClientError>;

    /// Retrieves the requester's own records. This routes to the
    /// registry's `mine` endpoint so other users' drafts are never
    /// exposed.
    async fn list_mine(&mut self) -> Result<Vec<TrainingRecord>, ClientError>;

    /// Applies a partial update through the registry's approval
    /// workflow.
    async fn update(
        &mut self,
        id: u64,
        patch: &UpdatePatch,
    ) -> Result<TrainingRecord, ClientError>;

    /// Removes a record. Admins only.
    async fn delete(&mut self, id: u64) -> Result<(), ClientError>;
}
