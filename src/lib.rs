//! tourwatch - OCTO tour availability watcher
//!
//! Tracks, for every watched tour, the latest date on which a slot is
//! bookable, and notifies when that date moves forward.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`availability`] - Booking API client and best-slot selection
//! - [`sync`] - Per-tour update workflow and concurrent fan-out
//! - [`scheduler`] - Wall-clock aligned tick loop
//! - [`storage`] - Latest-availability and tour persistence (SQLite, memory)
//! - [`notifications`] - Pushover and webhook channels
//! - [`server`] - HTTP API over the tracked tours
//! - [`summary`] - Plain-text summary tables
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus metrics
//! - [`models`] - Core data structures and types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use tourwatch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(SqliteStore::open(&config.database.path)?);
//!     let client = Arc::new(OctoClient::new(config.octo_config()?)?);
//!
//!     let coordinator = SyncCoordinator::new(Arc::new(TourUpdater::new(client, store.clone())));
//!     let handler = NotifyOnAdvance::new(config.notifiers()?);
//!     let report = coordinator
//!         .sync_tracked(store.as_ref(), &handler, &CancellationToken::new())
//!         .await?;
//!     println!("{} tours advanced", report.advanced.len());
//!     Ok(())
//! }
//! ```

pub mod availability;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod scheduler;
pub mod server;
pub mod storage;
pub mod summary;
pub mod sync;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::availability::{AvailabilitySource, OctoClient, OctoConfig};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{BestSlotRecord, DateWindow, Slot, StoredAvailability, Tour};
    pub use crate::scheduler::Scheduler;
    pub use crate::storage::{LatestAvailabilityStore, MemoryStore, SqliteStore, TourRepository};
    pub use crate::sync::{AdvanceHandler, NotifyOnAdvance, SyncCoordinator, TourUpdater};
}

pub use models::{BestSlotRecord, DateWindow, Slot, Tour};
