use fedreg_core::{ApprovalStatus, TrainingRecord};

use super::{MemoryStorage, TrainingStorage};

fn draft(name: &str, owner: u64) -> TrainingRecord {
    let mut record = TrainingRecord::new(name, None, None);
    record.owner = Some(owner);
    record
}

#[tokio::test]
async fn test_create_assigns_sequential_ids() {
    let mut storage = MemoryStorage::new();
    let first = storage.create(draft("first", 7)).await.unwrap();
    let second = storage.create(draft("second", 7)).await.unwrap();
    assert_eq!(first.id, Some(1));
    assert_eq!(second.id, Some(2));
}

#[tokio::test]
async fn test_get_missing_record() {
    let mut storage = MemoryStorage::new();
    assert!(storage.get(42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_is_ordered() {
    let mut storage = MemoryStorage::new();
    for name in &["a", "b", "c"] {
        storage.create(draft(name, 7)).await.unwrap();
    }
    let records = storage.list().await.unwrap();
    let ids: Vec<_> = records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn test_list_by_owner() {
    let mut storage = MemoryStorage::new();
    storage.create(draft("mine", 7)).await.unwrap();
    storage.create(draft("theirs", 8)).await.unwrap();
    let records = storage.list_by_owner(7).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "mine");
}

#[tokio::test]
async fn test_has_pending() {
    let mut storage = MemoryStorage::new();
    assert!(!storage.has_pending(7).await.unwrap());

    let record = storage.create(draft("mine", 7)).await.unwrap();
    assert!(storage.has_pending(7).await.unwrap());
    assert!(!storage.has_pending(8).await.unwrap());

    let mut approved = record;
    approved.approval_status = ApprovalStatus::Approved;
    assert!(storage.update(&approved).await.unwrap());
    assert!(!storage.has_pending(7).await.unwrap());
}

#[tokio::test]
async fn test_update_missing_record() {
    let mut storage = MemoryStorage::new();
    let mut record = draft("ghost", 7);
    record.id = Some(42);
    assert!(!storage.update(&record).await.unwrap());
}

#[tokio::test]
async fn test_update_without_id_is_an_error() {
    let mut storage = MemoryStorage::new();
    assert!(storage.update(&draft("ghost", 7)).await.is_err());
}

#[tokio::test]
async fn test_delete() {
    let mut storage = MemoryStorage::new();
    let record = storage.create(draft("mine", 7)).await.unwrap();
    assert!(storage.delete(record.id.unwrap()).await.unwrap());
    assert!(!storage.delete(record.id.unwrap()).await.unwrap());
    assert!(storage.get(record.id.unwrap()).await.unwrap().is_none());
}
