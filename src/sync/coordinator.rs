//! Concurrent fan-out of tour updates
//!
//! One task per tour on a [`JoinSet`]; results are drained by a single loop,
//! advancing tours are handed to the [`AdvanceHandler`] after every task has
//! finished, and all failures are folded into one [`BatchError`].

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::error::{BatchError, SyncError, TourFailure, TourSyncError, UpdateError};
use super::updater::TourUpdater;
use super::{AdvanceHandler, SyncReport};
use crate::metrics::{Metrics, OUTCOME_ADVANCED, OUTCOME_FAILED, OUTCOME_UNCHANGED};
use crate::models::{BestSlotRecord, DateWindow, Tour};
use crate::storage::TourRepository;

type TaskOutcome = std::thread::Result<Result<Option<BestSlotRecord>, UpdateError>>;

/// Runs [`TourUpdater`] across many tours per tick
pub struct SyncCoordinator {
    updater: Arc<TourUpdater>,
    window: Option<DateWindow>,
    metrics: Option<Metrics>,
}

impl SyncCoordinator {
    pub fn new(updater: Arc<TourUpdater>) -> Self {
        Self {
            updater,
            window: None,
            metrics: None,
        }
    }

    /// Query a fixed window instead of the rolling one-year lookahead
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn updater(&self) -> &Arc<TourUpdater> {
        &self.updater
    }

    /// Update every tour concurrently.
    ///
    /// A failing tour never stops the others. `handler.on_advance` is awaited
    /// once per advanced tour before returning; its errors join the aggregate.
    pub async fn sync_all(
        &self,
        tours: &[Tour],
        handler: &dyn AdvanceHandler,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, BatchError> {
        let _timer = self.metrics.as_ref().map(Metrics::start_sync_timer);
        if let Some(metrics) = &self.metrics {
            metrics.set_tracked_tours(tours.len());
        }

        let mut tasks = JoinSet::new();
        for tour in tours {
            let updater = Arc::clone(&self.updater);
            let window = self.window;
            let tour = tour.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let update = async {
                    match &window {
                        Some(window) => updater.update_in_window(&tour, window, &cancel).await,
                        None => updater.update(&tour, &cancel).await,
                    }
                };
                let outcome: TaskOutcome = AssertUnwindSafe(update).catch_unwind().await;
                (tour, outcome)
            });
        }

        let mut report = SyncReport::default();
        let mut failures = Vec::new();
        let mut advanced = Vec::new();
        let mut finished = HashSet::new();

        while let Some(joined) = tasks.join_next().await {
            let (tour, outcome) = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Update task failed to join");
                    continue;
                }
            };
            finished.insert(tour.id);

            let failure = match outcome {
                Ok(Ok(Some(record))) => {
                    self.record(OUTCOME_ADVANCED);
                    advanced.push((tour, record));
                    continue;
                }
                Ok(Ok(None)) => {
                    self.record(OUTCOME_UNCHANGED);
                    report.unchanged.push(tour.id);
                    continue;
                }
                Ok(Err(e)) => TourFailure::Update(e),
                Err(panic) => TourFailure::Panicked(panic_message(panic.as_ref())),
            };

            self.record(OUTCOME_FAILED);
            tracing::warn!(tour_id = %tour.id, tour = %tour.name, error = %failure, "Tour update failed");
            failures.push(TourSyncError {
                tour_id: tour.id,
                tour_name: tour.name,
                failure,
            });
        }

        for tour in tours.iter().filter(|t| !finished.contains(&t.id)) {
            self.record(OUTCOME_FAILED);
            failures.push(TourSyncError {
                tour_id: tour.id,
                tour_name: tour.name.clone(),
                failure: TourFailure::Aborted,
            });
        }

        for (tour, record) in advanced {
            if let Err(e) = handler.on_advance(&tour, &record).await {
                tracing::warn!(tour_id = %tour.id, error = %e, "Advance handler failed");
                failures.push(TourSyncError {
                    tour_id: tour.id,
                    tour_name: tour.name.clone(),
                    failure: TourFailure::Handler(e),
                });
            }
            report.advanced.push(record);
        }

        tracing::info!(
            tours = tours.len(),
            advanced = report.advanced.len(),
            unchanged = report.unchanged.len(),
            failed = failures.len(),
            "Sync batch finished"
        );

        if failures.is_empty() {
            Ok(report)
        } else {
            failures.sort_by_key(|f| f.tour_id);
            Err(BatchError { failures, report })
        }
    }

    /// Load the tracked tours from `repo` and sync them all
    pub async fn sync_tracked(
        &self,
        repo: &dyn TourRepository,
        handler: &dyn AdvanceHandler,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let tours = repo.list_tours().await?;
        Ok(self.sync_all(&tours, handler, cancel).await?)
    }

    fn record(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_update(outcome);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
