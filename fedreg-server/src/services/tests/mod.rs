use fedreg_core::{ApprovalStatus, Stage, TrainingRecord, UpdateError, UpdatePatch};

use super::{ServiceError, TrainingService};
use crate::storage::MemoryStorage;

const ADMIN: u64 = 1;
const OWNER: u64 = 7;
const OTHER: u64 = 8;

fn service() -> TrainingService<MemoryStorage> {
    TrainingService::new(MemoryStorage::new(), vec![ADMIN])
}

fn draft(name: &str) -> TrainingRecord {
    TrainingRecord::new(name, Some("x".to_string()), None)
}

/// Registers a draft and walks it to the operational stage.
async fn operational(service: &mut TrainingService<MemoryStorage>, name: &str) -> u64 {
    let requester = service.requester(OWNER);
    let record = service.create(requester, draft(name)).await.unwrap();
    let id = record.id.unwrap();
    let patch = UpdatePatch {
        state: Some(Stage::Operation),
        ..UpdatePatch::default()
    };
    service.update(requester, id, patch).await.unwrap();
    id
}

#[tokio::test]
async fn test_create_assigns_server_fields() {
    let mut service = service();
    let mut draft = draft("trial-1");
    // whatever the client claims for the server-assigned fields is dropped
    draft.id = Some(999);
    draft.owner = Some(OTHER);
    draft.approval_status = ApprovalStatus::Approved;

    let record = service
        .create(service.requester(OWNER), draft)
        .await
        .unwrap();
    assert_eq!(record.id, Some(1));
    assert_eq!(record.owner, Some(OWNER));
    assert_eq!(record.approval_status, ApprovalStatus::Pending);
    assert_eq!(record.approved_at, None);
    assert!(record.created_at.is_some());
}

#[tokio::test]
async fn test_create_rejects_second_pending_submission() {
    let mut service = service();
    let requester = service.requester(OWNER);
    service.create(requester, draft("first")).await.unwrap();

    let result = service.create(requester, draft("second")).await;
    assert!(matches!(result, Err(ServiceError::DuplicatePending)));

    // another user is not affected
    service
        .create(service.requester(OTHER), draft("second"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_allowed_again_after_decision() {
    let mut service = service();
    let requester = service.requester(OWNER);
    let id = operational(&mut service, "first").await;
    service
        .update(
            service.requester(ADMIN),
            id,
            UpdatePatch::approval(ApprovalStatus::Approved),
        )
        .await
        .unwrap();

    service.create(requester, draft("second")).await.unwrap();
}

#[tokio::test]
async fn test_create_rejects_invalid_schema() {
    let mut service = service();
    let mut invalid = draft("trial-1");
    invalid.description = Some("a".repeat(100));
    let result = service.create(service.requester(OWNER), invalid).await;
    assert!(matches!(result, Err(ServiceError::Schema(_))));
}

#[tokio::test]
async fn test_get_missing_record() {
    let mut service = service();
    assert!(matches!(
        service.get(42).await,
        Err(ServiceError::NotFound(42))
    ));
}

#[tokio::test]
async fn test_approval_requires_admin() {
    let mut service = service();
    let id = operational(&mut service, "trial-1").await;
    let result = service
        .update(
            service.requester(OWNER),
            id,
            UpdatePatch::approval(ApprovalStatus::Approved),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Forbidden)));
}

#[tokio::test]
async fn test_approval_while_in_development_is_rejected() {
    let mut service = service();
    let record = service
        .create(service.requester(OWNER), draft("trial-1"))
        .await
        .unwrap();
    let id = record.id.unwrap();

    let result = service
        .update(
            service.requester(ADMIN),
            id,
            UpdatePatch::approval(ApprovalStatus::Approved),
        )
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Update(UpdateError::StillInDevelopment))
    ));
    // and the record is unchanged
    let stored = service.get(id).await.unwrap();
    assert_eq!(stored.approval_status, ApprovalStatus::Pending);
    assert_eq!(stored.approved_at, None);
}

#[tokio::test]
async fn test_approval_happy_path() {
    let mut service = service();
    let id = operational(&mut service, "trial-1").await;
    let updated = service
        .update(
            service.requester(ADMIN),
            id,
            UpdatePatch::approval(ApprovalStatus::Approved),
        )
        .await
        .unwrap();
    assert_eq!(updated.approval_status, ApprovalStatus::Approved);
    assert!(updated.approved_at.is_some());
}

#[tokio::test]
async fn test_rejected_training_cannot_be_approved() {
    let mut service = service();
    let id = operational(&mut service, "trial-1").await;
    let admin = service.requester(ADMIN);
    service
        .update(admin, id, UpdatePatch::approval(ApprovalStatus::Rejected))
        .await
        .unwrap();

    let result = service
        .update(admin, id, UpdatePatch::approval(ApprovalStatus::Approved))
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::Update(UpdateError::AlreadyRejected))
    ));
}

#[tokio::test]
async fn test_operational_training_freezes_name() {
    let mut service = service();
    let id = operational(&mut service, "trial-1").await;
    let patch = UpdatePatch {
        name: Some("renamed".to_string()),
        ..UpdatePatch::default()
    };
    let result = service.update(service.requester(OWNER), id, patch).await;
    assert!(matches!(
        result,
        Err(ServiceError::Update(UpdateError::FrozenField("name")))
    ));
}

#[tokio::test]
async fn test_owner_may_edit_user_metadata() {
    let mut service = service();
    let id = operational(&mut service, "trial-1").await;
    let mut map = std::collections::HashMap::new();
    map.insert("note".to_string(), serde_json::json!("hello"));
    let patch = UpdatePatch {
        user_metadata: Some(map.clone()),
        ..UpdatePatch::default()
    };
    let updated = service
        .update(service.requester(OWNER), id, patch)
        .await
        .unwrap();
    assert_eq!(updated.user_metadata, map);
}

#[tokio::test]
async fn test_update_by_stranger_is_forbidden() {
    let mut service = service();
    let id = operational(&mut service, "trial-1").await;
    let patch = UpdatePatch {
        is_active: Some(false),
        ..UpdatePatch::default()
    };
    let result = service.update(service.requester(OTHER), id, patch).await;
    assert!(matches!(result, Err(ServiceError::Forbidden)));
}

#[tokio::test]
async fn test_delete_is_admin_only() {
    let mut service = service();
    let id = operational(&mut service, "trial-1").await;

    let result = service.delete(service.requester(OWNER), id).await;
    assert!(matches!(result, Err(ServiceError::Forbidden)));

    service.delete(service.requester(ADMIN), id).await.unwrap();
    assert!(matches!(
        service.get(id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_mine_only_returns_own_records() {
    let mut service = service();
    service
        .create(service.requester(OWNER), draft("mine"))
        .await
        .unwrap();
    service
        .create(service.requester(OTHER), draft("theirs"))
        .await
        .unwrap();

    let all = service.list().await.unwrap();
    assert_eq!(all.len(), 2);

    let mine = service.list_mine(service.requester(OWNER)).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "mine");
}
