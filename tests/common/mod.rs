//! Common test utilities

use chrono::NaiveDate;
use serde_json::{json, Value};
use tourwatch::availability::{OctoClient, OctoConfig};
use tourwatch::models::{DateWindow, Tour};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create a tour with a predictable id
pub fn tour(id: u128, name: &str) -> Tour {
    Tour::new(
        Uuid::from_u128(id),
        name,
        format!("https://tours.example.com/{id}"),
    )
}

/// Window starting 2025-06-01 and ending a year later
#[allow(dead_code)]
pub fn window() -> DateWindow {
    DateWindow::year_from(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

/// One slot object as returned by the availability endpoint
pub fn slot_json(starts_at: &str, available: bool) -> Value {
    json!({
        "id": starts_at,
        "localDateTimeStart": starts_at,
        "available": available,
        "status": if available { "AVAILABLE" } else { "SOLD_OUT" },
        "vacancies": if available { 12 } else { 0 },
        "unitPricing": [
            {"unitType": "ADULT", "original": 9900, "retail": 9900, "currency": "USD", "currencyPrecision": 2}
        ]
    })
}

/// Client pointed at the mock server
#[allow(dead_code)]
pub fn octo_client(server: &MockServer) -> OctoClient {
    OctoClient::new(OctoConfig::new("test-token").with_base_url(server.uri())).unwrap()
}

/// Answer availability requests for `tour_id` with `slots`
#[allow(dead_code)]
pub async fn mount_slots(server: &MockServer, tour_id: Uuid, slots: Value) {
    Mock::given(method("POST"))
        .and(path("/octo/availability"))
        .and(body_partial_json(json!({"productId": tour_id})))
        .respond_with(ResponseTemplate::new(200).set_body_json(slots))
        .mount(server)
        .await;
}
