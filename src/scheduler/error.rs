//! Error types for the scheduler module

use std::fmt;
use std::time::Duration;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Tick interval is unusable (zero, or too large to align)
    InvalidInterval { interval: Duration, reason: String },

    /// Interval string could not be parsed
    InvalidIntervalFormat { value: String },

    /// The cancellation token fired
    Cancelled,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInterval { interval, reason } => {
                write!(f, "Invalid interval {:?}: {}", interval, reason)
            }
            Self::InvalidIntervalFormat { value } => {
                write!(
                    f,
                    "Invalid interval '{}'. Expected a number with unit ms, s, m or h (e.g. 15s)",
                    value
                )
            }
            Self::Cancelled => write!(f, "Scheduler cancelled"),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid interval error
    pub fn invalid_interval(interval: Duration, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            interval,
            reason: reason.into(),
        }
    }

    /// Create an interval format error
    pub fn invalid_format(value: impl Into<String>) -> Self {
        Self::InvalidIntervalFormat {
            value: value.into(),
        }
    }

    /// Whether the loop stopped because it was asked to
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
