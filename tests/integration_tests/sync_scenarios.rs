//! Sync scenarios over OctoClient + SqliteStore with a mocked booking API

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tourwatch::metrics::{Metrics, OUTCOME_ADVANCED, OUTCOME_FAILED, OUTCOME_UNCHANGED};
use tourwatch::models::Tour;
use tourwatch::notifications::{Notifier, WebhookNotifier};
use tourwatch::storage::{LatestAvailabilityStore, SqliteStore, TourRepository};
use tourwatch::sync::{NotifyOnAdvance, SyncCoordinator, TourFailure, TourUpdater};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{mount_slots, octo_client, slot_json, tour, window};

struct Harness {
    server: MockServer,
    store: Arc<SqliteStore>,
    coordinator: SyncCoordinator,
    metrics: Metrics,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let metrics = Metrics::new().unwrap();
    let updater = Arc::new(TourUpdater::new(
        Arc::new(octo_client(&server)),
        store.clone(),
    ));
    let coordinator = SyncCoordinator::new(updater)
        .with_window(window())
        .with_metrics(metrics.clone());

    Harness {
        server,
        store,
        coordinator,
        metrics,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn silent() -> NotifyOnAdvance {
    NotifyOnAdvance::new(Vec::new())
}

/// D1 < D2 available, D3 later but sold out: D2 is persisted and reported
#[tokio::test]
async fn test_latest_available_date_is_persisted() {
    let h = harness().await;
    let tour = tour(1, "Sistine Chapel");
    mount_slots(
        &h.server,
        tour.id,
        json!([
            slot_json("2025-07-01T09:00:00+02:00", true),
            slot_json("2025-07-15T09:00:00+02:00", true),
            slot_json("2025-08-01T09:00:00+02:00", false),
        ]),
    )
    .await;

    let report = h
        .coordinator
        .sync_all(&[tour.clone()], &silent(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.advanced.len(), 1);
    assert_eq!(report.advanced[0].date(), date(2025, 7, 15));

    let stored = h.store.get_latest(tour.id).await.unwrap().unwrap();
    assert_eq!(stored.availability_date.date_naive(), date(2025, 7, 15));
    let raw: serde_json::Value = serde_json::from_str(stored.raw_data.as_deref().unwrap()).unwrap();
    assert_eq!(raw["localDateTimeStart"], "2025-07-15T09:00:00+02:00");
    assert_eq!(h.metrics.updates(OUTCOME_ADVANCED), 1);
}

/// Same fetch twice: the second run writes nothing and reports no advance
#[tokio::test]
async fn test_repeat_sync_is_idempotent() {
    let h = harness().await;
    let tour = tour(2, "Colosseum underground");
    mount_slots(
        &h.server,
        tour.id,
        json!([slot_json("2025-09-10T08:00:00+02:00", true)]),
    )
    .await;
    let cancel = CancellationToken::new();

    h.coordinator
        .sync_all(&[tour.clone()], &silent(), &cancel)
        .await
        .unwrap();
    let first = h.store.get_latest(tour.id).await.unwrap().unwrap();

    let report = h
        .coordinator
        .sync_all(&[tour.clone()], &silent(), &cancel)
        .await
        .unwrap();
    let second = h.store.get_latest(tour.id).await.unwrap().unwrap();

    assert!(report.advanced.is_empty());
    assert_eq!(report.unchanged, vec![tour.id]);
    assert_eq!(first, second);
    assert_eq!(h.metrics.updates(OUTCOME_UNCHANGED), 1);
}

/// A later fetch with only earlier dates never moves the stored date back
#[tokio::test]
async fn test_stored_date_never_regresses() {
    let h = harness().await;
    let tour = tour(3, "Vatican Gardens");
    let cancel = CancellationToken::new();

    Mock::given(method("POST"))
        .and(path("/octo/availability"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([slot_json("2025-10-01T09:00:00+02:00", true)])),
        )
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/octo/availability"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([slot_json("2025-06-20T09:00:00+02:00", true)])),
        )
        .mount(&h.server)
        .await;

    h.coordinator
        .sync_all(&[tour.clone()], &silent(), &cancel)
        .await
        .unwrap();
    let report = h
        .coordinator
        .sync_all(&[tour.clone()], &silent(), &cancel)
        .await
        .unwrap();

    assert!(report.advanced.is_empty());
    let stored = h.store.get_latest(tour.id).await.unwrap().unwrap();
    assert_eq!(stored.availability_date.date_naive(), date(2025, 10, 1));
}

/// No available slot: the window-start sentinel is stored once
#[tokio::test]
async fn test_nothing_available_stores_sentinel() {
    let h = harness().await;
    let tour = tour(4, "Scavi tour");
    mount_slots(
        &h.server,
        tour.id,
        json!([slot_json("2025-07-01T09:00:00+02:00", false)]),
    )
    .await;
    let cancel = CancellationToken::new();

    let first = h
        .coordinator
        .sync_all(&[tour.clone()], &silent(), &cancel)
        .await
        .unwrap();
    let second = h
        .coordinator
        .sync_all(&[tour.clone()], &silent(), &cancel)
        .await
        .unwrap();

    assert_eq!(first.advanced.len(), 1);
    assert!(first.advanced[0].is_sentinel());
    assert!(second.advanced.is_empty());

    let stored = h.store.get_latest(tour.id).await.unwrap().unwrap();
    assert_eq!(stored.availability_date.date_naive(), window().start());
    assert_eq!(stored.raw_data.as_deref(), Some("null"));
}

/// One tour failing does not stop the other from advancing
#[tokio::test]
async fn test_partial_failure_is_isolated() {
    let h = harness().await;
    let failing = tour(5, "Broken product");
    let healthy = tour(6, "Castel Sant'Angelo");

    Mock::given(method("POST"))
        .and(path("/octo/availability"))
        .and(body_partial_json(json!({"productId": failing.id})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&h.server)
        .await;
    mount_slots(
        &h.server,
        healthy.id,
        json!([slot_json("2025-11-11T11:00:00+01:00", true)]),
    )
    .await;

    let err = h
        .coordinator
        .sync_all(
            &[failing.clone(), healthy.clone()],
            &silent(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.len(), 1);
    assert!(err.contains(failing.id));
    assert!(matches!(err.failures[0].failure, TourFailure::Update(_)));
    assert!(err.to_string().contains(&format!("tour {}", failing.id)));

    assert_eq!(err.report.advanced.len(), 1);
    assert_eq!(err.report.advanced[0].tour_id, healthy.id);
    assert!(h.store.get_latest(healthy.id).await.unwrap().is_some());
    assert!(h.store.get_latest(failing.id).await.unwrap().is_none());
    assert_eq!(h.metrics.updates(OUTCOME_FAILED), 1);
}

/// Tracked tours come from the repository; advances reach the webhook once
#[tokio::test]
async fn test_sync_tracked_notifies_on_advance() {
    let h = harness().await;
    let tour = Tour::new(uuid::Uuid::from_u128(7), "Raphael Rooms", "");
    h.store.upsert_tour(&tour).await.unwrap();
    mount_slots(
        &h.server,
        tour.id,
        json!([slot_json("2025-12-24T18:00:00+01:00", true)]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({
            "title": "New tour availabilities posted",
            "message": "Tour: Raphael Rooms\nDate: 2025-12-24"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;

    let webhook = WebhookNotifier::from_url(format!("{}/hook", h.server.uri())).unwrap();
    let handler = NotifyOnAdvance::new(vec![Arc::new(webhook) as Arc<dyn Notifier>]);
    let cancel = CancellationToken::new();

    let first = h
        .coordinator
        .sync_tracked(h.store.as_ref(), &handler, &cancel)
        .await
        .unwrap();
    let second = h
        .coordinator
        .sync_tracked(h.store.as_ref(), &handler, &cancel)
        .await
        .unwrap();

    assert_eq!(first.advanced.len(), 1);
    assert!(second.advanced.is_empty());
}

/// A cancelled batch reports every tour as cancelled and writes nothing
#[tokio::test]
async fn test_cancelled_batch() {
    let h = harness().await;
    let tour = tour(8, "Cancelled tour");
    mount_slots(
        &h.server,
        tour.id,
        json!([slot_json("2025-07-01T09:00:00+02:00", true)]),
    )
    .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h
        .coordinator
        .sync_all(&[tour.clone()], &silent(), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(h.store.get_latest(tour.id).await.unwrap().is_none());
}
