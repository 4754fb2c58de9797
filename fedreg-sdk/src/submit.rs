//! The submission workflow.

use thiserror::Error;
use tracing::info;

use crate::{
    client::ClientError,
    store::{LocalStore, StoreError},
    RegistryClient,
};
use fedreg_core::{SchemaError, TrainingRecord};

/// Error returned by a [`Submission`].
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("test trainings are never uploaded")]
    TestEntity,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Registers a new draft with the registry.
///
/// On success the local cache entry moves from its draft path to the
/// permanent path keyed by the server-assigned identifier, and the
/// canonical record returned by the registry is persisted there.
pub struct Submission {
    draft: TrainingRecord,
}

impl Submission {
    pub fn new(draft: TrainingRecord) -> Self {
        Self { draft }
    }

    /// Runs the workflow.
    ///
    /// # Errors
    /// Fails fast when the draft is flagged as a test entity or violates
    /// the schema rules. Upload failures are fatal; the write path never
    /// falls back to the local cache.
    pub async fn run<C>(
        self,
        client: &mut C,
        store: &LocalStore,
    ) -> Result<TrainingRecord, SubmitError>
    where
        C: RegistryClient + Send,
    {
        if self.draft.for_test {
            return Err(SubmitError::TestEntity);
        }
        self.draft.validate()?;

        let draft_key = self.draft.storage_key();
        store.write(&self.draft)?;

        let registered = client.create(&self.draft).await?;

        store.relocate(&draft_key, &registered.storage_key())?;
        store.write(&registered)?;
        info!(id = ?registered.id, "training submitted");
        Ok(registered)
    }
}
