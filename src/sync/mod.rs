//! Availability synchronization engine
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ SyncCoordinator::sync_all                   │
//! │  - one JoinSet task per tour                │
//! │  - aggregates per-tour failures             │
//! └─────────────────────────────────────────────┘
//!          │ spawn                  │ after join
//!          ▼                        ▼
//! ┌──────────────────┐    ┌──────────────────────┐
//! │   TourUpdater    │    │    AdvanceHandler    │
//! │ fetch → select → │    │  (NotifyOnAdvance)   │
//! │ compare → store  │    └──────────────────────┘
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let updater = Arc::new(TourUpdater::new(source, store));
//! let coordinator = SyncCoordinator::new(updater);
//! let handler = NotifyOnAdvance::new(notifiers);
//!
//! match coordinator.sync_all(&tours, &handler, &cancel).await {
//!     Ok(report) => tracing::info!(advanced = report.advanced.len(), "done"),
//!     Err(batch) => tracing::error!(%batch, "some tours failed"),
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod updater;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::metrics::Metrics;
use crate::models::{BestSlotRecord, Tour};
use crate::notifications::{AvailabilityAlert, Notifier};

pub use coordinator::SyncCoordinator;
pub use error::{BatchError, BoxError, SyncError, TourFailure, TourSyncError, UpdateError};
pub use updater::TourUpdater;

/// What one batch did, for logging and summaries
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Records persisted because the tour's best slot advanced
    pub advanced: Vec<BestSlotRecord>,
    /// Tours whose stored record was already the same or later
    pub unchanged: Vec<Uuid>,
}

/// Reacts to a tour whose best slot advanced
#[async_trait]
pub trait AdvanceHandler: Send + Sync {
    async fn on_advance(&self, tour: &Tour, record: &BestSlotRecord) -> Result<(), BoxError>;
}

/// Sends an availability alert to every configured notifier.
///
/// Delivery failures are logged and counted, never returned; an advance is
/// already persisted by the time this runs.
pub struct NotifyOnAdvance {
    notifiers: Vec<Arc<dyn Notifier>>,
    metrics: Option<Metrics>,
}

impl NotifyOnAdvance {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self {
            notifiers,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[async_trait]
impl AdvanceHandler for NotifyOnAdvance {
    async fn on_advance(&self, tour: &Tour, record: &BestSlotRecord) -> Result<(), BoxError> {
        let alert = AvailabilityAlert::new(tour, record);
        tracing::info!(tour = %tour.name, date = %alert.date, "New availability posted");

        let body = alert.body();
        for notifier in &self.notifiers {
            let delivered = match notifier.send(alert.title(), &body).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(
                        channel = notifier.name(),
                        tour_id = %tour.id,
                        error = %e,
                        "Failed to send notification"
                    );
                    false
                }
            };

            if let Some(metrics) = &self.metrics {
                metrics.record_notification(notifier.name(), delivered);
            }
        }

        Ok(())
    }
}
