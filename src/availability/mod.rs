//! Availability lookups against the booking API
//!
//! The engine only talks to [`AvailabilitySource`]; [`OctoClient`] is the
//! production implementation for OCTO-compatible endpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use tourwatch::availability::{AvailabilitySource, OctoClient, OctoConfig};
//! use tourwatch::models::DateWindow;
//!
//! let client = OctoClient::new(OctoConfig::new("access-token"))?;
//! let window = DateWindow::year_from(chrono::Local::now().date_naive());
//! let slots = client.fetch(&tour, &window).await?;
//! let best = tourwatch::availability::select_best_slot(tour.id, &window, &slots, chrono::Utc::now());
//! ```

pub mod octo;
pub mod selector;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DateWindow, Slot, Tour};

pub use octo::{OctoClient, OctoConfig};
pub use selector::select_best_slot;

/// Result type for availability lookups
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while querying the booking API
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the API
    #[error("unexpected response code: {status}, body: {body:?}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("error parsing response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Tour has no endpoint for the requested lookup
    #[error("tour {0} has no description API URL")]
    MissingEndpoint(uuid::Uuid),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// Transport errors and 5xx/429 responses may succeed on a later tick
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::MissingEndpoint(_) | Self::InvalidConfig(_) => false,
        }
    }
}

/// Source of bookable slots for a tour
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Fetch every slot for `tour` within `window`, available or not
    async fn fetch(&self, tour: &Tour, window: &DateWindow) -> FetchResult<Vec<Slot>>;
}
