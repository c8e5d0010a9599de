//! Pushover push notifications

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{check_response, Notifier, NotifyError, NotifyResult};

/// Pushover message endpoint
pub const DEFAULT_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Pushover channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushoverConfig {
    /// Application API token
    pub app_token: String,
    /// User or group key receiving the message
    pub recipient_token: String,
    /// Message endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

impl PushoverConfig {
    pub fn new(app_token: impl Into<String>, recipient_token: impl Into<String>) -> Self {
        Self {
            app_token: app_token.into(),
            recipient_token: recipient_token.into(),
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
        }
    }

    /// Override the message endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.app_token.trim().is_empty() {
            return Err("Pushover app token cannot be empty".to_string());
        }
        if self.recipient_token.trim().is_empty() {
            return Err("Pushover recipient token cannot be empty".to_string());
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("Pushover API URL must start with http:// or https://".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct PushoverMessage<'a> {
    token: &'a str,
    user: &'a str,
    title: &'a str,
    message: &'a str,
}

/// Sends messages through the Pushover API
pub struct PushoverNotifier {
    config: PushoverConfig,
    client: Client,
}

impl PushoverNotifier {
    pub fn new(config: PushoverConfig) -> NotifyResult<Self> {
        config.validate().map_err(NotifyError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn name(&self) -> &str {
        "pushover"
    }

    async fn send(&self, title: &str, body: &str) -> NotifyResult<()> {
        let message = PushoverMessage {
            token: &self.config.app_token,
            user: &self.config.recipient_token,
            title,
            message: body,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&message)
            .send()
            .await?;
        check_response(response).await?;

        tracing::info!(title, "Pushover notification delivered");
        Ok(())
    }
}
