//! Notification channels
//!
//! Each channel delivers a title and a plain-text body to one destination.
//! Delivery is attempted once; failures are returned to the caller.

pub mod pushover;
pub mod webhook;

use async_trait::async_trait;

/// Result type for channel operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that can occur while delivering a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Destination answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NotifyError {
    /// Transport failures and server-side errors are worth trying again later
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::HttpError(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidConfig(_) => false,
        }
    }
}

/// A destination for human-readable alerts
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used in logs and metrics labels
    fn name(&self) -> &str;

    /// Deliver one message
    async fn send(&self, title: &str, body: &str) -> NotifyResult<()>;
}

/// Read the response and turn anything but 2xx into [`NotifyError::Rejected`]
pub(crate) async fn check_response(response: reqwest::Response) -> NotifyResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());

    Err(NotifyError::Rejected {
        status: status.as_u16(),
        body,
    })
}
