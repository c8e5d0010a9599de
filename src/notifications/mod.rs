//! Notifications for newly posted availability
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │      SyncCoordinator (advance handler)     │
//! └────────────────────────────────────────────┘
//!                     │  AvailabilityAlert
//!            ┌────────┴────────┐
//!            ▼                 ▼
//!      ┌──────────┐      ┌──────────┐
//!      │ Pushover │      │ Webhook  │
//!      └──────────┘      └──────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use tourwatch::notifications::{AvailabilityAlert, Notifier, WebhookNotifier};
//!
//! let notifier = WebhookNotifier::from_url("https://hooks.example.com/tours")?;
//! let alert = AvailabilityAlert::new(&tour, &record);
//! notifier.send(alert.title(), &alert.body()).await?;
//! ```

pub mod channels;

use chrono::NaiveDate;

use crate::models::{BestSlotRecord, Tour};

pub use channels::pushover::{PushoverConfig, PushoverNotifier};
pub use channels::webhook::{WebhookConfig, WebhookNotifier};
pub use channels::{Notifier, NotifyError, NotifyResult};

/// Title used for every availability alert
pub const ALERT_TITLE: &str = "New tour availabilities posted";

/// Message announcing that a tour's best bookable date moved forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityAlert {
    pub tour_name: String,
    pub date: NaiveDate,
}

impl AvailabilityAlert {
    pub fn new(tour: &Tour, record: &BestSlotRecord) -> Self {
        Self {
            tour_name: tour.name.clone(),
            date: record.date(),
        }
    }

    pub fn title(&self) -> &'static str {
        ALERT_TITLE
    }

    pub fn body(&self) -> String {
        format!("Tour: {}\nDate: {}", self.tour_name, self.date.format("%Y-%m-%d"))
    }
}
