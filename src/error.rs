//! Unified error handling for the tourwatch crate
//!
//! Each module keeps its own error type; [`Error`] wraps them so that callers
//! crossing module boundaries (the HTTP API, the commands) can classify a
//! failure without matching on every concrete type.
//!
//! ```rust,ignore
//! match result {
//!     Err(err) if err.is_recoverable() => {
//!         tracing::warn!(category = err.category().as_str(), "Retrying next tick: {err}")
//!     }
//!     Err(err) => return Err(err),
//!     Ok(report) => report,
//! }
//! ```

use thiserror::Error;

pub use crate::availability::FetchError;
pub use crate::notifications::NotifyError;
pub use crate::scheduler::SchedulerError;
pub use crate::storage::StorageError;
pub use crate::summary::SummaryError;
pub use crate::sync::{BatchError, SyncError, UpdateError};

/// Coarse error kind, used for HTTP status mapping and log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Booking API and notification transport errors
    Network,
    /// Database errors
    Storage,
    /// Bad configuration or input
    Config,
    /// Scheduling and cancellation
    Scheduler,
    /// Rendering and encoding errors
    Formatting,
    /// Requested entity does not exist
    NotFound,
    /// Anything else
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Scheduler => "scheduler",
            Self::Formatting => "formatting",
            Self::NotFound => "not_found",
            Self::Other => "other",
        }
    }
}

/// Any error the library can return
#[derive(Debug, Error)]
pub enum Error {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Update error: {0}")]
    Update(#[from] UpdateError),

    #[error("Sync failed:\n{0}")]
    Batch(#[from] BatchError),

    #[error("Summary error: {0}")]
    Summary(#[from] SummaryError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Whether the next tick might succeed where this attempt failed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::Notify(e) => e.is_recoverable(),
            Self::Update(e) => e.is_recoverable(),
            Self::Batch(e) => e.failures.iter().any(|f| match &f.failure {
                crate::sync::TourFailure::Update(u) => u.is_recoverable(),
                _ => false,
            }),
            Self::Scheduler(_) | Self::Summary(_) | Self::Config(_) | Self::NotFound(_) => false,
            Self::Other { .. } => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::InvalidConfig(_)) | Self::Notify(NotifyError::InvalidConfig(_)) => {
                ErrorCategory::Config
            }
            Self::Fetch(_) | Self::Notify(_) | Self::Batch(_) => ErrorCategory::Network,
            Self::Update(UpdateError::Storage(_)) | Self::Storage(_) => ErrorCategory::Storage,
            Self::Update(UpdateError::Cancelled) | Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Update(UpdateError::Serialization(_)) | Self::Summary(_) => {
                ErrorCategory::Formatting
            }
            Self::Update(UpdateError::Fetch(_)) => ErrorCategory::Network,
            Self::Config(_) => ErrorCategory::Config,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Wrap a foreign error under a short description
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::ListTours(e) => Self::Storage(e),
            SyncError::Batch(e) => Self::Batch(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
