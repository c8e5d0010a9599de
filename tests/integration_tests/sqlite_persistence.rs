//! SQLite file persistence across reopen

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tourwatch::storage::{LatestAvailabilityStore, SqliteStore, TourRepository};
use tourwatch::summary::{collect_latest, SummaryRenderer};
use tourwatch::sync::{NotifyOnAdvance, SyncCoordinator, TourUpdater};
use wiremock::MockServer;

use crate::common::{mount_slots, octo_client, slot_json, tour, window};

#[tokio::test]
async fn test_latest_availability_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("tours.db");
    let server = MockServer::start().await;
    let tracked = tour(21, "Pristine Sistine");

    {
        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        store.upsert_tour(&tracked).await.unwrap();
        mount_slots(
            &server,
            tracked.id,
            json!([slot_json("2026-03-03T07:30:00+01:00", true)]),
        )
        .await;

        let updater = Arc::new(TourUpdater::new(Arc::new(octo_client(&server)), store.clone()));
        SyncCoordinator::new(updater)
            .with_window(window())
            .sync_tracked(
                store.as_ref(),
                &NotifyOnAdvance::new(Vec::new()),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
    }

    let reopened = SqliteStore::open(&db_path).unwrap();
    let tours = reopened.list_tours().await.unwrap();
    assert_eq!(tours, vec![tracked.clone()]);

    let stored = reopened.get_latest(tracked.id).await.unwrap().unwrap();
    assert_eq!(
        stored.availability_date.to_rfc3339(),
        "2026-03-03T07:30:00+01:00"
    );

    let entries = collect_latest(tours, &reopened).await.unwrap();
    let table = SummaryRenderer::new().unwrap().render_latest(&entries).unwrap();
    assert!(table.contains("Pristine Sistine"));
    assert!(table.contains("2026-03-03"));
}

#[tokio::test]
async fn test_deleted_tour_is_not_synced() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path().join("tours.db")).unwrap());
    let server = MockServer::start().await;

    let kept = tour(31, "Kept");
    let dropped = tour(32, "Dropped");
    store.upsert_tour(&kept).await.unwrap();
    store.upsert_tour(&dropped).await.unwrap();
    assert!(store.delete_tour(dropped.id).await.unwrap());
    assert!(!store.delete_tour(dropped.id).await.unwrap());

    mount_slots(
        &server,
        kept.id,
        json!([slot_json("2025-07-04T10:00:00-04:00", true)]),
    )
    .await;

    let updater = Arc::new(TourUpdater::new(Arc::new(octo_client(&server)), store.clone()));
    let report = SyncCoordinator::new(updater)
        .with_window(window())
        .sync_tracked(
            store.as_ref(),
            &NotifyOnAdvance::new(Vec::new()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.advanced.len(), 1);
    assert_eq!(report.advanced[0].tour_id, kept.id);
    assert!(store.get_latest(dropped.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_write_blocked_by_lock_completes_after_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("tours.db");
    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    let server = MockServer::start().await;
    let tracked = tour(41, "Vatican Key Master");
    mount_slots(
        &server,
        tracked.id,
        json!([slot_json("2025-07-15T09:00:00+02:00", true)]),
    )
    .await;

    // A second writer holds the database lock while the update runs
    let locker = rusqlite::Connection::open(&db_path).unwrap();
    locker.execute_batch("BEGIN IMMEDIATE").unwrap();

    let updater = TourUpdater::new(Arc::new(octo_client(&server)), store.clone());
    let cancel = CancellationToken::new();

    let release = async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        locker.execute_batch("COMMIT").unwrap();
    };
    let update_window = window();
    let (result, ()) = tokio::join!(
        updater.update_in_window(&tracked, &update_window, &cancel),
        release
    );

    let advanced = result.unwrap().expect("the started write is reported");
    assert_eq!(advanced.starts_at.to_rfc3339(), "2025-07-15T09:00:00+02:00");

    let stored = store.get_latest(tracked.id).await.unwrap().unwrap();
    assert_eq!(stored.availability_date, advanced.starts_at);

    let again = updater
        .update_in_window(&tracked, &window(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(again.is_none());
}
