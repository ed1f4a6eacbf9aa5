//! Concurrent point accrual on one profile is last-write-wins.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eduportal_common::UserProfile;
use eduportal_backend::store::{Document, SqliteStore, StoredDocument};
use eduportal_backend::{DocumentStore, ProfileService, StoreError};
use serde_json::Value;
use tokio::sync::Barrier;

/// Holds every read until two readers have arrived, so both accruals see
/// the same starting balance.
struct LockstepStore {
    inner: SqliteStore,
    barrier: Barrier,
}

#[async_trait]
impl DocumentStore for LockstepStore {
    fn backend(&self) -> &'static str {
        "lockstep"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let doc = self.inner.get(collection, id).await?;
        self.barrier.wait().await;
        Ok(doc)
    }

    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        self.inner.set(collection, id, doc).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Document,
    ) -> Result<(), StoreError> {
        self.inner.update(collection, id, fields).await
    }

    async fn add(&self, collection: &str, doc: &Document) -> Result<String, StoreError> {
        self.inner.add(collection, doc).await
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.inner.find_by_field(collection, field, value).await
    }
}

#[tokio::test]
async fn test_concurrent_accrual_loses_an_update() {
    let profile = UserProfile::with_defaults("u1", "ada@example.com");
    let snapshot = serde_json::to_value(&profile)
        .unwrap()
        .as_object()
        .cloned()
        .unwrap();

    let inner = SqliteStore::in_memory().unwrap();
    inner.set("users", "u1", &snapshot).await.unwrap();
    let store = Arc::new(LockstepStore {
        inner,
        barrier: Barrier::new(2),
    });
    let service = ProfileService::new(store.clone());

    let (first, second) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(
            service.accrue_points("u1", 10, "Attending Class"),
            service.accrue_points("u1", 10, "Attending Class"),
        )
    })
    .await
    .expect("accruals deadlocked");

    assert_eq!(first.unwrap().points, 10);
    assert_eq!(second.unwrap().points, 10);

    // Both read 0 before either wrote, so one +10 is lost.
    let stored = store.inner.get("users", "u1").await.unwrap().unwrap();
    assert_eq!(stored["points"], 10);
}

#[tokio::test]
async fn test_sequential_accrual_adds_up() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let service = ProfileService::new(store);
    service.fetch_or_create("u1", "ada@example.com").await.unwrap();

    service.accrue_points("u1", 10, "first").await.unwrap();
    let profile = service.accrue_points("u1", 10, "second").await.unwrap();
    assert_eq!(profile.points, 20);
}
