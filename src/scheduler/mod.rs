//! Fixed-interval tick loop aligned to wall-clock boundaries
//!
//! # Overview
//!
//! [`Scheduler::run`] invokes its tick callback once immediately, then on every
//! multiple of the interval since the Unix epoch until the cancellation token
//! fires. A 15 second interval started at 10:00:07 ticks at 10:00:07, 10:00:15,
//! 10:00:30 and so on. Ticks missed while a slow callback was running are
//! skipped, not replayed.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tourwatch::scheduler::Scheduler;
//!
//! let scheduler = Scheduler::new(Duration::from_secs(15))?;
//! let cancel = CancellationToken::new();
//!
//! scheduler
//!     .run(&cancel, || async {
//!         coordinator.sync_tracked(&*repo, &handler, &cancel).await
//!     })
//!     .await?;
//! ```

pub mod error;

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::metrics::Metrics;

pub use error::{SchedulerError, SchedulerResult};

/// First wall-clock multiple of `interval` strictly after `now`
pub fn next_aligned_tick(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let step = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX).max(1);
    let next = now
        .timestamp_millis()
        .div_euclid(step)
        .saturating_mul(step)
        .saturating_add(step);

    DateTime::from_timestamp_millis(next).unwrap_or(now)
}

/// Parse an interval such as `15s`, `5m`, `1h`, `500ms` or a bare number of seconds
pub fn parse_interval(value: &str) -> SchedulerResult<Duration> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let amount: u64 = digits
        .parse()
        .map_err(|_| SchedulerError::invalid_format(value))?;

    let interval = match unit.trim() {
        "ms" => Duration::from_millis(amount),
        "" | "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(3600)),
        _ => return Err(SchedulerError::invalid_format(value)),
    };

    Ok(interval)
}

/// Runs a tick callback on an aligned fixed interval
#[derive(Clone)]
pub struct Scheduler {
    interval: Duration,
    metrics: Option<Metrics>,
}

impl Scheduler {
    /// Create a scheduler; the interval must be non-zero
    pub fn new(interval: Duration) -> SchedulerResult<Self> {
        if interval.is_zero() {
            return Err(SchedulerError::invalid_interval(
                interval,
                "must be greater than zero",
            ));
        }

        if chrono::Duration::from_std(interval).is_err() {
            return Err(SchedulerError::invalid_interval(interval, "too large"));
        }

        Ok(Self {
            interval,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick until `cancel` fires.
    ///
    /// Errors returned by `on_tick` are logged and the loop keeps going.
    /// Always ends with [`SchedulerError::Cancelled`].
    pub async fn run<F, Fut, E>(&self, cancel: &CancellationToken, mut on_tick: F) -> SchedulerResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        if cancel.is_cancelled() {
            return Err(SchedulerError::Cancelled);
        }

        tracing::info!(interval = ?self.interval, "Scheduler started");
        self.tick(&mut on_tick).await;

        let now = Utc::now();
        let boundary = next_aligned_tick(now, self.interval);
        let delay = (boundary - now).to_std().unwrap_or_default();
        tracing::debug!(next = %boundary, "Waiting for first aligned tick");

        let mut ticker = tokio::time::interval_at(Instant::now() + delay, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduler stopped");
                    return Err(SchedulerError::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            self.tick(&mut on_tick).await;
        }
    }

    async fn tick<F, Fut, E>(&self, on_tick: &mut F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        if let Some(metrics) = &self.metrics {
            metrics.record_tick();
        }

        if let Err(e) = on_tick().await {
            tracing::error!(error = %e, "Scheduled tick failed");
        }
    }
}
