//! Status updates through the store and out to subscribers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fieldwalk_core::{
    Dataset, Error, FieldGroup, GroupKey, MeterIds, NewFieldGroup, RequestContext, Result,
    StatusEvent, VisitStatus,
};
use fieldwalk_hub::{Hub, StatusService, Subscription};
use fieldwalk_store::{GroupStore, MemoryStore};

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let keys = [("route-7", "04524"), ("route-7", "03045"), ("route-9", "04524")];
    for (dataset, postal_code) in keys {
        store
            .insert(NewFieldGroup {
                dataset: Dataset::new(dataset),
                postal_code: postal_code.to_string(),
                address: "서울 중구 세종대로 110".to_string(),
                meter_ids: MeterIds::single("A-1"),
                x: 126.978,
                y: 37.5665,
                status: VisitStatus::Unvisited,
            })
            .await
            .unwrap();
    }
    store
}

async fn next(sub: &mut Subscription) -> Option<StatusEvent> {
    tokio::time::timeout(Duration::from_millis(100), sub.recv())
        .await
        .ok()
        .flatten()
}

#[tokio::test]
async fn test_update_reaches_each_connected_subscriber_once() {
    let service = StatusService::new(seeded_store().await, Hub::new(16));
    let ctx = RequestContext::new("route-7").with_user("kim");
    let mut viewers: Vec<Subscription> = (0..3).map(|_| service.subscribe(&ctx)).collect();

    let group = service
        .set_status(&ctx, "04524", VisitStatus::Visited)
        .await
        .expect("update should commit");
    assert_eq!(group.status, VisitStatus::Visited);

    for viewer in &mut viewers {
        let event = next(viewer).await.expect("event delivered");
        assert_eq!(event.postal_code, "04524");
        assert_eq!(event.status, VisitStatus::Visited);
        assert_eq!(event.group_id, group.id);
        assert!(next(viewer).await.is_none());
    }
}

#[tokio::test]
async fn test_late_subscriber_gets_no_replay() {
    let service = StatusService::new(seeded_store().await, Hub::new(16));
    let ctx = RequestContext::new("route-7");

    service
        .set_status(&ctx, "04524", VisitStatus::Unavailable)
        .await
        .unwrap();
    let mut late = service.subscribe(&ctx);

    assert!(next(&mut late).await.is_none());
}

#[tokio::test]
async fn test_unknown_group_is_not_found_and_silent() {
    let service = StatusService::new(seeded_store().await, Hub::new(16));
    let ctx = RequestContext::new("route-7");
    let mut viewer = service.subscribe(&ctx);

    let err = service
        .set_status(&ctx, "99999", VisitStatus::Visited)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
    assert!(next(&mut viewer).await.is_none());
}

#[tokio::test]
async fn test_blank_postal_code_rejected() {
    let service = StatusService::new(seeded_store().await, Hub::new(16));
    let err = service
        .set_status(&RequestContext::new("route-7"), "  ", VisitStatus::Visited)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[tokio::test]
async fn test_updates_are_scoped_to_caller_dataset() {
    let store = seeded_store().await;
    let service = StatusService::new(store.clone(), Hub::new(16));
    let mut other = service.subscribe(&RequestContext::new("route-9"));

    service
        .set_status(&RequestContext::new("route-7"), "04524", VisitStatus::Visited)
        .await
        .unwrap();

    assert!(next(&mut other).await.is_none());
    let untouched = store
        .get(&GroupKey::new(Dataset::new("route-9"), "04524"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, VisitStatus::Unvisited);
}

#[tokio::test]
async fn test_dropped_subscriber_does_not_affect_others() {
    let service = StatusService::new(seeded_store().await, Hub::new(16));
    let ctx = RequestContext::new("route-7");
    let gone = service.subscribe(&ctx);
    let mut stays = service.subscribe(&ctx);
    drop(gone);

    service.set_status(&ctx, "03045", VisitStatus::Visited).await.unwrap();

    assert_eq!(next(&mut stays).await.unwrap().postal_code, "03045");
    assert_eq!(service.hub().subscriber_count(&ctx.dataset), 1);
}

#[tokio::test]
async fn test_summary_counts_statuses() {
    let service = StatusService::new(seeded_store().await, Hub::default());
    let ctx = RequestContext::new("route-7");
    service.set_status(&ctx, "03045", VisitStatus::Visited).await.unwrap();

    let summary = service.summary(&ctx).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.count(VisitStatus::Visited), 1);
    assert_eq!(summary.count(VisitStatus::Unvisited), 1);
    assert_eq!(summary.count(VisitStatus::Unavailable), 0);
    assert_eq!(service.groups(&ctx).await.unwrap().len(), 2);
}

/// Store whose writes always fail.
struct UnreachableStore;

#[async_trait]
impl GroupStore for UnreachableStore {
    async fn get(&self, _key: &GroupKey) -> Result<Option<FieldGroup>> {
        Err(Error::transport("store offline"))
    }

    async fn insert(&self, _group: NewFieldGroup) -> Result<FieldGroup> {
        Err(Error::transport("store offline"))
    }

    async fn update_status(
        &self,
        _key: &GroupKey,
        _status: VisitStatus,
    ) -> Result<Option<FieldGroup>> {
        Err(Error::transport("store offline"))
    }

    async fn update_meters(
        &self,
        _key: &GroupKey,
        _expected: &MeterIds,
        _meters: &MeterIds,
    ) -> Result<Option<FieldGroup>> {
        Err(Error::transport("store offline"))
    }

    async fn list(&self, _dataset: &Dataset) -> Result<Vec<FieldGroup>> {
        Err(Error::transport("store offline"))
    }
}

#[tokio::test]
async fn test_failed_write_publishes_nothing() {
    let service = StatusService::new(Arc::new(UnreachableStore), Hub::new(16));
    let ctx = RequestContext::new("route-7");
    let mut viewer = service.subscribe(&ctx);

    let err = service
        .set_status(&ctx, "04524", VisitStatus::Visited)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(next(&mut viewer).await.is_none());
}
