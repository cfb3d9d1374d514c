//! End-to-end ingestion through the in-memory store.

use std::sync::Arc;

use fieldwalk_core::{Dataset, Error, RawRecord, RequestContext, ResolutionCause, VisitStatus};
use fieldwalk_ingest::Reconciler;
use fieldwalk_store::GroupStore;
use rust_xlsxwriter::Workbook;

use crate::common::{TestHarness, seoul_geocoder};

const UPLOAD: &str = "\
순번,주소,계기번호
1,서울 중구 세종대로 110,A-100
2,서울 중구 세종대로 112,A-200
3,서울 종로구 사직로 161,B-300
";

#[tokio::test]
async fn test_rows_sharing_postal_code_form_one_group() {
    let harness = TestHarness::new(seoul_geocoder());

    let report = harness
        .ingestor
        .ingest_file(&harness.ctx, "route.csv", UPLOAD.as_bytes().to_vec())
        .await
        .expect("upload should ingest");

    assert_eq!(report.rows_seen, 3);
    assert_eq!(report.groups_created, 2);
    assert_eq!(report.groups_updated, 1);
    assert!(report.failures.is_empty());

    let groups = harness.store.list(&harness.ctx.dataset).await.unwrap();
    assert_eq!(groups.len(), 2);
    let city_hall = groups.iter().find(|g| g.postal_code == "04524").unwrap();
    assert_eq!(city_hall.meter_ids.len(), 2);
    assert!(city_hall.meter_ids.contains("A-100"));
    assert!(city_hall.meter_ids.contains("A-200"));
    assert_eq!(city_hall.status, VisitStatus::Unvisited);
}

#[tokio::test]
async fn test_repeat_upload_is_idempotent() {
    let harness = TestHarness::new(seoul_geocoder());
    harness
        .ingestor
        .ingest_file(&harness.ctx, "route.csv", UPLOAD.as_bytes().to_vec())
        .await
        .unwrap();
    let before = harness.store.list(&harness.ctx.dataset).await.unwrap();

    let again = harness
        .ingestor
        .ingest_file(&harness.ctx, "route.csv", UPLOAD.as_bytes().to_vec())
        .await
        .unwrap();

    assert_eq!(again.unchanged, 3);
    assert_eq!(again.groups_touched(), 0);
    assert_eq!(harness.store.list(&harness.ctx.dataset).await.unwrap(), before);
}

#[tokio::test]
async fn test_unresolvable_row_does_not_abort_batch() {
    let harness = TestHarness::new(seoul_geocoder());
    let records = vec![
        RawRecord::new("서울 중구 세종대로 110", "A-100"),
        RawRecord::new("nowhere at all", "X-1"),
        RawRecord::new("서울 종로구 사직로 161", "B-300"),
    ];

    let report = harness.ingestor.ingest(&harness.ctx, records).await;

    assert_eq!(report.rows_seen, 3);
    assert_eq!(report.groups_created, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].address, "nowhere at all");
    assert_eq!(report.failures[0].cause, ResolutionCause::NoCandidates);
    assert_eq!(harness.store.len().await, 2);
}

#[tokio::test]
async fn test_missing_postal_code_groups_by_coordinate() {
    let harness = TestHarness::new(seoul_geocoder());
    let records = vec![
        RawRecord::new("산 12-3", "F-1"),
        RawRecord::new("산 12-4", "F-2"),
    ];

    let report = harness.ingestor.ingest(&harness.ctx, records).await;

    assert_eq!(report.groups_created, 1);
    assert_eq!(report.groups_updated, 1);
    let groups = harness.store.list(&harness.ctx.dataset).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].postal_code, "LOC_127.5678_37.1234");
    assert!(groups[0].key().is_fallback());
}

#[tokio::test]
async fn test_datasets_are_isolated() {
    let harness = TestHarness::new(seoul_geocoder());
    let other = RequestContext::new("route-9");
    let record = vec![RawRecord::new("서울 중구 세종대로 110", "A-100")];

    harness.ingestor.ingest(&harness.ctx, record.clone()).await;
    let report = harness.ingestor.ingest(&other, record).await;

    assert_eq!(report.groups_created, 1);
    assert_eq!(harness.store.list(&Dataset::new("route-9")).await.unwrap().len(), 1);
    assert_eq!(harness.store.list(&harness.ctx.dataset).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_address_column_fails_before_any_row() {
    let harness = TestHarness::new(seoul_geocoder());

    let err = harness
        .ingestor
        .ingest_file(&harness.ctx, "bad.csv", b"name,meter\nkim,1\n".to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Schema { .. }));
    assert!(harness.store.is_empty().await);
}

#[tokio::test]
async fn test_unsupported_extension_rejected() {
    let harness = TestHarness::new(seoul_geocoder());
    let err = harness
        .ingestor
        .ingest_file(&harness.ctx, "route.pdf", UPLOAD.as_bytes().to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));
}

#[tokio::test]
async fn test_spreadsheet_upload() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "주소").unwrap();
    sheet.write_string(0, 1, "계기번호").unwrap();
    sheet.write_string(1, 0, "서울 중구 세종대로 110").unwrap();
    sheet.write_number(1, 1, 1001.0).unwrap();
    sheet.write_string(2, 0, "서울 중구 세종대로 112").unwrap();
    sheet.write_number(2, 1, 1002.0).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("route.xlsx");
    workbook.save(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();

    let harness = TestHarness::new(seoul_geocoder());
    let report = harness
        .ingestor
        .ingest_file(&harness.ctx, "route.xlsx", bytes)
        .await
        .expect("workbook should ingest");

    assert_eq!(report.rows_seen, 2);
    let groups = harness.store.list(&harness.ctx.dataset).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].meter_ids.as_slice(), &["1001", "1002"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reconciles_keep_every_meter_id() {
    let harness = TestHarness::new(seoul_geocoder());
    let reconciler = Arc::new(Reconciler::new(harness.store.clone()));
    let geo = fieldwalk_core::GeoResult {
        x: 126.978,
        y: 37.5665,
        postal_code: Some("04524".to_string()),
    };

    let mut tasks = Vec::new();
    for i in 0..32 {
        let reconciler = reconciler.clone();
        let ctx = harness.ctx.clone();
        let geo = geo.clone();
        tasks.push(tokio::spawn(async move {
            let record = RawRecord::new("서울 중구 세종대로 110", format!("M-{i}"));
            reconciler.reconcile(&ctx, &record, &geo).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let groups = harness.store.list(&harness.ctx.dataset).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].meter_ids.len(), 32);
}
