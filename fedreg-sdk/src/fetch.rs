//! Two-tier lookups.
//!
//! Reads ask the registry first and fall back to the local cache when the
//! registry cannot be reached; every other failure propagates. Reads
//! never mutate remote state.

use std::collections::HashSet;

use thiserror::Error;
use tracing::warn;

use crate::{
    client::ClientError,
    store::{LocalStore, StoreError},
    RegistryClient,
};
use fedreg_core::TrainingRecord;

/// Error returned by the lookup functions.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Retrieves a single training.
///
/// A numeric key names a registered record: the registry is asked first
/// and a communication failure falls back to the local cache. A
/// non-numeric key can only name a local draft and is resolved locally.
/// A successful remote fetch refreshes the local cache.
pub async fn get<C>(
    client: &mut C,
    store: &LocalStore,
    key: &str,
) -> Result<TrainingRecord, FetchError>
where
    C: RegistryClient + Send,
{
    let id = match key.parse::<u64>() {
        Ok(id) => id,
        Err(_) => return Ok(store.read(key)?),
    };

    match client.get(id).await {
        Ok(record) => {
            if let Err(e) = store.write(&record) {
                warn!("couldn't cache training {}: {}", id, e);
            }
            Ok(record)
        }
        Err(ClientError::Communication(e)) => {
            warn!(
                "couldn't reach the registry ({}); looking for training {} locally",
                e, id
            );
            Ok(store.read(key)?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Retrieves all trainings visible to the client.
///
/// Remote records are merged with the local drafts whose identifiers the
/// registry did not report. An `owner` filter naming the client's own
/// user routes to the registry's `mine` endpoint instead of the generic
/// listing, so other users' drafts are never exposed. With `local_only`
/// the registry is not contacted at all.
pub async fn all<C>(
    client: &mut C,
    store: &LocalStore,
    owner: Option<u64>,
    local_only: bool,
) -> Result<Vec<TrainingRecord>, FetchError>
where
    C: RegistryClient + Send,
{
    let mut trainings = Vec::new();

    if !local_only {
        let remote = if owner.is_some() && owner == client.user_id() {
            client.list_mine().await
        } else {
            client.list().await
        };
        match remote {
            Ok(records) => trainings = records,
            Err(ClientError::Communication(e)) => {
                warn!(
                    "couldn't retrieve the trainings from the registry ({}); \
                     listing local ones only",
                    e
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    let remote_ids: HashSet<Option<u64>> =
        trainings.iter().map(|training| training.id).collect();
    for local in store.list() {
        if !remote_ids.contains(&local.id) {
            trainings.push(local);
        }
    }
    Ok(trainings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockRegistryClient;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        (dir, store)
    }

    fn registered(name: &str, id: u64) -> TrainingRecord {
        let mut record = TrainingRecord::new(name, None, None);
        record.id = Some(id);
        record
    }

    #[tokio::test]
    async fn test_get_caches_the_remote_record() {
        let (_dir, store) = store();
        let record = registered("trial-1", 42);

        let mut client = MockRegistryClient::new();
        let remote = record.clone();
        client.expect_get().returning(move |_| Ok(remote.clone()));

        let fetched = get(&mut client, &store, "42").await.unwrap();
        assert_eq!(fetched, record);
        assert_eq!(store.read("42").unwrap(), record);
    }

    #[tokio::test]
    async fn test_get_falls_back_to_the_cache_on_communication_failure() {
        let (_dir, store) = store();
        let record = registered("trial-1", 42);
        store.write(&record).unwrap();

        let mut client = MockRegistryClient::new();
        client
            .expect_get()
            .returning(|_| Err(ClientError::Communication("connection refused".to_string())));

        let fetched = get(&mut client, &store, "42").await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn test_get_propagates_a_remote_not_found() {
        let (_dir, store) = store();
        // a local copy exists, but the registry's answer is authoritative
        store.write(&registered("trial-1", 42)).unwrap();

        let mut client = MockRegistryClient::new();
        client.expect_get().returning(|_| Err(ClientError::NotFound));

        let result = get(&mut client, &store, "42").await;
        assert!(matches!(result, Err(FetchError::Client(ClientError::NotFound))));
    }

    #[tokio::test]
    async fn test_get_resolves_non_numeric_keys_locally() {
        let (_dir, store) = store();
        let draft = TrainingRecord::new("draft", None, None);
        store.write(&draft).unwrap();

        // the registry must not be contacted
        let mut client = MockRegistryClient::new();
        let fetched = get(&mut client, &store, &draft.generated_uid).await.unwrap();
        assert_eq!(fetched, draft);

        let result = get(&mut client, &store, "no-such-draft").await;
        assert!(matches!(result, Err(FetchError::Store(StoreError::NotFound(_)))));
    }

    #[tokio::test]
    async fn test_all_merges_local_drafts() {
        let (_dir, store) = store();
        let remote = registered("remote", 1);
        // cached copy of a registered record must not show up twice
        store.write(&remote).unwrap();
        let draft = TrainingRecord::new("draft", None, None);
        store.write(&draft).unwrap();

        let mut client = MockRegistryClient::new();
        let listed = vec![remote.clone()];
        client.expect_user_id().returning(|| None);
        client.expect_list().returning(move || Ok(listed.clone()));

        let mut trainings = all(&mut client, &store, None, false).await.unwrap();
        trainings.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(trainings.len(), 2);
        assert_eq!(trainings[0].name, "draft");
        assert_eq!(trainings[1].name, "remote");
    }

    #[tokio::test]
    async fn test_all_routes_own_records_to_the_mine_endpoint() {
        let (_dir, store) = store();

        let mut client = MockRegistryClient::new();
        client.expect_user_id().returning(|| Some(7));
        client
            .expect_list_mine()
            .times(1)
            .returning(|| Ok(vec![registered("mine", 1)]));

        let trainings = all(&mut client, &store, Some(7), false).await.unwrap();
        assert_eq!(trainings.len(), 1);
        assert_eq!(trainings[0].name, "mine");
    }

    #[tokio::test]
    async fn test_all_degrades_to_local_on_communication_failure() {
        let (_dir, store) = store();
        store.write(&TrainingRecord::new("draft", None, None)).unwrap();

        let mut client = MockRegistryClient::new();
        client.expect_user_id().returning(|| None);
        client
            .expect_list()
            .returning(|| Err(ClientError::Communication("connection refused".to_string())));

        let trainings = all(&mut client, &store, None, false).await.unwrap();
        assert_eq!(trainings.len(), 1);
        assert_eq!(trainings[0].name, "draft");
    }

    #[tokio::test]
    async fn test_all_local_only_never_contacts_the_registry() {
        let (_dir, store) = store();
        store.write(&TrainingRecord::new("draft", None, None)).unwrap();

        let mut client = MockRegistryClient::new();
        let trainings = all(&mut client, &store, None, true).await.unwrap();
        assert_eq!(trainings.len(), 1);
    }
}
