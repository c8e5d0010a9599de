//! Webhook notification channel
//!
//! Posts each alert as a JSON document:
//!
//! ```json
//! {
//!   "title": "New tour availabilities posted",
//!   "message": "Tour: Pristine Sistine\nDate: 2026-10-18",
//!   "sent_at": "2025-10-18T10:00:15Z"
//! }
//! ```
//!
//! Delivery is attempted once; a missed alert is not replayed because the
//! advance it reports has already been persisted.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{check_response, Notifier, NotifyError, NotifyResult};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where and how alerts are posted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>`
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Extra request headers, e.g. a routing key for a chat bridge
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Check the endpoint is an absolute http(s) URL and the timeout is usable
    pub fn validate(&self) -> Result<(), String> {
        let endpoint =
            Url::parse(&self.url).map_err(|e| format!("Invalid webhook URL '{}': {e}", self.url))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(format!(
                "Webhook URL must use http or https, got '{}'",
                endpoint.scheme()
            ));
        }

        if self.timeout_secs == 0 {
            return Err("Webhook timeout must be at least one second".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    title: &'a str,
    message: &'a str,
    sent_at: String,
}

/// Posts alerts to an HTTP endpoint
///
/// ```rust,ignore
/// let notifier = WebhookNotifier::new(
///     WebhookConfig::new("https://hooks.example.com/tours").with_auth_token("hook-secret"),
/// )?;
/// notifier.send(ALERT_TITLE, "Tour: Pantheon\nDate: 2026-04-02").await?;
/// ```
pub struct WebhookNotifier {
    config: WebhookConfig,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> NotifyResult<Self> {
        config.validate().map_err(NotifyError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Notifier with default settings for `url`
    pub fn from_url(url: impl Into<String>) -> NotifyResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, title: &str, body: &str) -> NotifyResult<()> {
        let payload = AlertPayload {
            title,
            message: body,
            sent_at: Utc::now().to_rfc3339(),
        };

        let request = self
            .config
            .headers
            .iter()
            .fold(self.client.post(&self.config.url), |request, (name, value)| {
                request.header(name, value)
            });
        let request = match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        check_response(request.json(&payload).send().await?).await?;

        tracing::info!(url = %self.config.url, title, "Webhook alert delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_endpoint() {
        assert!(WebhookConfig::new("https://hooks.example.com/tours").validate().is_ok());
        assert!(WebhookConfig::new("http://localhost:9000/hook").validate().is_ok());
        assert!(WebhookConfig::new("").validate().is_err());
        assert!(WebhookConfig::new("hooks.example.com/tours").validate().is_err());
        assert!(WebhookConfig::new("ftp://hooks.example.com").validate().is_err());
        assert!(WebhookConfig::new("https://hooks.example.com")
            .with_timeout(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_builder_sets_auth_and_headers() {
        let config = WebhookConfig::new("https://hooks.example.com/tours")
            .with_auth_token("hook-secret")
            .with_header("X-Source", "tourwatch")
            .with_timeout(3);

        assert_eq!(config.auth_token.as_deref(), Some("hook-secret"));
        assert_eq!(config.headers.get("X-Source").map(String::as_str), Some("tourwatch"));
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_from_url() {
        let notifier = WebhookNotifier::from_url("https://hooks.example.com/alerts").unwrap();
        assert_eq!(notifier.name(), "webhook");
        assert_eq!(notifier.url(), "https://hooks.example.com/alerts");

        assert!(matches!(
            WebhookNotifier::from_url("not-a-url"),
            Err(NotifyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_from_toml_uses_defaults() {
        let config: WebhookConfig =
            toml::from_str(r#"url = "https://hooks.example.com/tours""#).unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.auth_token.is_none());
        assert!(config.headers.is_empty());
    }
}
