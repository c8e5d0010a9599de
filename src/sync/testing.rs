//! Fakes shared by the sync unit tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde_json::json;
use uuid::Uuid;

use crate::availability::{AvailabilitySource, FetchError, FetchResult};
use crate::models::{DateWindow, Slot, Tour};

pub fn window() -> DateWindow {
    DateWindow::year_from(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

/// Slot at 09:00 +02:00 on the given day of July 2025
pub fn slot(day: u32, available: bool) -> Slot {
    let starts_at = FixedOffset::east_opt(7200)
        .unwrap()
        .with_ymd_and_hms(2025, 7, day, 9, 0, 0)
        .unwrap();
    Slot::from_value(json!({
        "id": starts_at.to_rfc3339(),
        "localDateTimeStart": starts_at.to_rfc3339(),
        "available": available,
        "vacancies": if available { 10 } else { 0 },
        "unitPricing": [{"unitType": "ADULT", "retail": 9900, "currency": "USD"}],
    }))
    .unwrap()
}

#[derive(Default)]
pub struct FakeSource {
    slots: Mutex<Vec<Slot>>,
    failing: HashSet<Uuid>,
    panicking: HashSet<Uuid>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_window: Mutex<Option<DateWindow>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(self, slots: Vec<Slot>) -> Self {
        *self.slots.lock().unwrap() = slots;
        self
    }

    pub fn failing_for(mut self, tour_id: Uuid) -> Self {
        self.failing.insert(tour_id);
        self
    }

    pub fn panicking_for(mut self, tour_id: Uuid) -> Self {
        self.panicking.insert(tour_id);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_slots(&self, slots: Vec<Slot>) {
        *self.slots.lock().unwrap() = slots;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_window(&self) -> Option<DateWindow> {
        *self.last_window.lock().unwrap()
    }
}

#[async_trait]
impl AvailabilitySource for FakeSource {
    async fn fetch(&self, tour: &Tour, window: &DateWindow) -> FetchResult<Vec<Slot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_window.lock().unwrap() = Some(*window);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panicking.contains(&tour.id) {
            panic!("fake source exploded for {}", tour.name);
        }
        if self.failing.contains(&tour.id) {
            return Err(FetchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        Ok(self.slots.lock().unwrap().clone())
    }
}
