//! Best-slot selection
//!
//! Picks the latest-dated available slot out of one fetch. When several
//! available slots share the latest start time the first one encountered is
//! kept; no secondary ordering (price, vacancies) is applied.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{BestSlotRecord, DateWindow, Slot};

/// Select the available slot with the maximum start time.
///
/// Falls back to the window-start sentinel when no slot is available, so the
/// result can always be compared against the stored record.
pub fn select_best_slot(
    tour_id: Uuid,
    window: &DateWindow,
    slots: &[Slot],
    recorded_at: DateTime<Utc>,
) -> BestSlotRecord {
    let mut best = BestSlotRecord::sentinel(tour_id, window, recorded_at);

    for slot in slots.iter().filter(|s| s.available) {
        if slot.starts_at > best.starts_at {
            best.starts_at = slot.starts_at;
            best.slot = Some(slot.clone());
        }
    }

    best
}
