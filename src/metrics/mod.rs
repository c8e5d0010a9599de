//! Prometheus metrics for the sync engine
//!
//! All collectors live in a [`Metrics`] value with its own registry; nothing is
//! registered globally. Construct one at startup and hand clones to the
//! coordinator, the advance handler and the HTTP server.
//!
//! # Example
//!
//! ```ignore
//! let metrics = tourwatch::metrics::Metrics::new()?;
//! metrics.record_tick();
//! println!("{}", metrics.encode()?);
//! ```

use prometheus::{
    Histogram, HistogramOpts, HistogramTimer, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

// ============================================================================
// Label values
// ============================================================================

/// Outcome label for a tour whose best slot moved forward
pub const OUTCOME_ADVANCED: &str = "advanced";
/// Outcome label for a tour whose best slot did not move
pub const OUTCOME_UNCHANGED: &str = "unchanged";
/// Outcome label for a tour whose update failed
pub const OUTCOME_FAILED: &str = "failed";

// ============================================================================
// Metrics
// ============================================================================

/// Collectors for scheduler ticks, tour updates and notifications
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    ticks: IntCounter,
    tour_updates: IntCounterVec,
    notifications: IntCounterVec,
    sync_duration: Histogram,
    tracked_tours: IntGauge,
}

impl Metrics {
    /// Create and register every collector in a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks = IntCounter::new("tourwatch_ticks_total", "Total number of scheduler ticks")?;
        let tour_updates = IntCounterVec::new(
            Opts::new("tourwatch_tour_updates_total", "Tour updates by outcome"),
            &["outcome"],
        )?;
        let notifications = IntCounterVec::new(
            Opts::new("tourwatch_notifications_total", "Notifications by channel and result"),
            &["channel", "result"],
        )?;
        let sync_duration = Histogram::with_opts(
            HistogramOpts::new(
                "tourwatch_sync_duration_seconds",
                "Time spent syncing all tours in one batch",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        let tracked_tours = IntGauge::new("tourwatch_tracked_tours", "Number of tracked tours")?;

        registry.register(Box::new(ticks.clone()))?;
        registry.register(Box::new(tour_updates.clone()))?;
        registry.register(Box::new(notifications.clone()))?;
        registry.register(Box::new(sync_duration.clone()))?;
        registry.register(Box::new(tracked_tours.clone()))?;

        Ok(Self {
            registry,
            ticks,
            tour_updates,
            notifications,
            sync_duration,
            tracked_tours,
        })
    }

    /// Encode all metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = String::new();
        TextEncoder::new().encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }

    pub fn record_tick(&self) {
        self.ticks.inc();
    }

    /// Count one tour update with the given outcome label
    pub fn record_update(&self, outcome: &str) {
        self.tour_updates.with_label_values(&[outcome]).inc();
    }

    pub fn record_notification(&self, channel: &str, delivered: bool) {
        let result = if delivered { "delivered" } else { "failed" };
        self.notifications.with_label_values(&[channel, result]).inc();
    }

    pub fn set_tracked_tours(&self, count: usize) {
        self.tracked_tours.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Start a batch timer; the duration is recorded when the guard drops
    pub fn start_sync_timer(&self) -> HistogramTimer {
        self.sync_duration.start_timer()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    pub fn updates(&self, outcome: &str) -> u64 {
        self.tour_updates.with_label_values(&[outcome]).get()
    }
}
