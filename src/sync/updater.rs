//! Per-tour update workflow
//!
//! fetch → select best slot → compare with the stored record → persist when
//! it advanced. Reads are raced against the cancellation token; the write is
//! not, since a blocking write keeps running after its future is dropped.

use std::future::Future;
use std::sync::Arc;

use chrono::{Local, Utc};
use tokio_util::sync::CancellationToken;

use super::error::UpdateError;
use crate::availability::{select_best_slot, AvailabilitySource};
use crate::models::{BestSlotRecord, DateWindow, Tour};
use crate::storage::LatestAvailabilityStore;

/// Runs the update workflow for one tour at a time
pub struct TourUpdater {
    source: Arc<dyn AvailabilitySource>,
    store: Arc<dyn LatestAvailabilityStore>,
}

impl TourUpdater {
    pub fn new(source: Arc<dyn AvailabilitySource>, store: Arc<dyn LatestAvailabilityStore>) -> Self {
        Self { source, store }
    }

    /// Update `tour` over the default lookahead window starting today
    pub async fn update(
        &self,
        tour: &Tour,
        cancel: &CancellationToken,
    ) -> Result<Option<BestSlotRecord>, UpdateError> {
        let window = DateWindow::year_from(Local::now().date_naive());
        self.update_in_window(tour, &window, cancel).await
    }

    /// Update `tour` over an explicit window.
    ///
    /// Returns `Some(record)` when the best slot advanced and was persisted,
    /// `None` when the stored record is the same or later, including when a
    /// concurrent update stored a later slot first. At most one write is
    /// issued per call, and once issued it is awaited even if `cancel` fires.
    pub async fn update_in_window(
        &self,
        tour: &Tour,
        window: &DateWindow,
        cancel: &CancellationToken,
    ) -> Result<Option<BestSlotRecord>, UpdateError> {
        let slots = guarded(cancel, self.source.fetch(tour, window)).await?;
        let candidate = select_best_slot(tour.id, window, &slots, Utc::now());

        let stored = guarded(cancel, self.store.get_latest(tour.id)).await?;
        if let Some(stored) = &stored {
            if !stored.is_superseded_by(&candidate) {
                tracing::debug!(
                    tour_id = %tour.id,
                    stored = %stored.availability_date,
                    candidate = %candidate.starts_at,
                    "No new availability"
                );
                return Ok(None);
            }
        }

        let record = candidate.to_stored()?;
        if cancel.is_cancelled() {
            return Err(UpdateError::Cancelled);
        }
        if !self.store.put_latest(&record).await? {
            tracing::debug!(
                tour_id = %tour.id,
                candidate = %candidate.starts_at,
                "Concurrent update already stored a later slot"
            );
            return Ok(None);
        }

        tracing::info!(
            tour_id = %tour.id,
            tour = %tour.name,
            date = %candidate.date(),
            previous = ?stored.map(|s| s.availability_date.date_naive()),
            "Latest availability advanced"
        );

        Ok(Some(candidate))
    }
}

async fn guarded<T, E, F>(cancel: &CancellationToken, fut: F) -> Result<T, UpdateError>
where
    F: Future<Output = Result<T, E>>,
    UpdateError: From<E>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UpdateError::Cancelled),
        result = fut => result.map_err(UpdateError::from),
    }
}
