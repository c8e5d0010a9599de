//! Error types for tour synchronization

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use super::SyncReport;
use crate::availability::FetchError;
use crate::storage::StorageError;

/// Boxed error returned by advance handlers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single tour update
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("error getting availability: {0}")]
    Fetch(#[from] FetchError),

    #[error("error accessing latest availability: {0}")]
    Storage(#[from] StorageError),

    #[error("error encoding availability: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("update cancelled")]
    Cancelled,
}

impl UpdateError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::Serialization(_) => false,
            Self::Cancelled => true,
        }
    }
}

/// Why a tour failed within a batch
#[derive(Error, Debug)]
pub enum TourFailure {
    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("update task panicked: {0}")]
    Panicked(String),

    #[error("update task did not complete")]
    Aborted,

    #[error("advance handler failed: {0}")]
    Handler(#[source] BoxError),
}

/// A failure attributed to one tour
#[derive(Error, Debug)]
#[error("tour {tour_id}: {failure}")]
pub struct TourSyncError {
    pub tour_id: Uuid,
    pub tour_name: String,
    #[source]
    pub failure: TourFailure,
}

impl TourSyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.failure, TourFailure::Update(UpdateError::Cancelled))
    }
}

/// Every per-tour failure of one batch, alongside what did succeed
#[derive(Debug)]
pub struct BatchError {
    pub failures: Vec<TourSyncError>,
    pub report: SyncReport,
}

impl BatchError {
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether `tour_id` is among the failures
    pub fn contains(&self, tour_id: Uuid) -> bool {
        self.failures.iter().any(|f| f.tour_id == tour_id)
    }

    /// True when every failure is a cancellation
    pub fn is_cancelled(&self) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(TourSyncError::is_cancelled)
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

/// Failure of a whole sync pass over the tracked tours
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("error listing tours: {0}")]
    ListTours(#[from] StorageError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}
