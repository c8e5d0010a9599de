//! HTTP client for OCTO availability endpoints
//!
//! Sends `POST /octo/availability` with the product id and date window and
//! decodes the returned slot list. No retries are attempted; a failed request
//! is reported to the caller and picked up again on the next tick.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::{AvailabilitySource, FetchError, FetchResult};
use crate::models::{DateWindow, Slot, Tour};

/// Default OCTO API host
pub const DEFAULT_BASE_URL: &str = "https://api.ventrata.com";

/// OCTO client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OctoConfig {
    /// API host, without the `/octo` path
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token for the API
    pub access_token: String,
    /// Product option to query
    #[serde(default = "default_option_id")]
    pub option_id: String,
    /// Currency prices are quoted in
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Values for the `Octo-Capabilities` header
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
    /// Optional request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_option_id() -> String {
    "DEFAULT".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_capabilities() -> Vec<String> {
    vec!["octo/pricing".to_string()]
}

impl OctoConfig {
    /// Create a new configuration with default host and options
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            access_token: access_token.into(),
            option_id: default_option_id(),
            currency: default_currency(),
            capabilities: default_capabilities(),
            timeout_secs: None,
        }
    }

    /// Set the API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid API base URL '{}': {e}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err("API base URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == Some(0) {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    fn availability_url(&self) -> String {
        format!("{}/octo/availability", self.base_url.trim_end_matches('/'))
    }
}

/// Request body for the availability endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityRequest<'a> {
    product_id: Uuid,
    option_id: &'a str,
    local_date_start: NaiveDate,
    local_date_end: NaiveDate,
    currency: &'a str,
}

/// OCTO availability client
pub struct OctoClient {
    config: OctoConfig,
    client: Client,
}

impl OctoClient {
    /// Create a new client
    pub fn new(config: OctoConfig) -> FetchResult<Self> {
        config.validate().map_err(FetchError::InvalidConfig)?;

        let mut builder = Client::builder().gzip(true);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Get the API host
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch the raw description document for a tour from its `api_url`
    pub async fn describe(&self, tour: &Tour) -> FetchResult<String> {
        let url = tour
            .api_url
            .as_deref()
            .ok_or(FetchError::MissingEndpoint(tour.id))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl AvailabilitySource for OctoClient {
    async fn fetch(&self, tour: &Tour, window: &DateWindow) -> FetchResult<Vec<Slot>> {
        let request = AvailabilityRequest {
            product_id: tour.id,
            option_id: &self.config.option_id,
            local_date_start: window.start(),
            local_date_end: window.end(),
            currency: &self.config.currency,
        };

        tracing::debug!(tour_id = %tour.id, window = %window, "Requesting availability");

        let response = self
            .client
            .post(self.config.availability_url())
            .header("Octo-Capabilities", self.config.capabilities.join(","))
            .header("Octo-Env", "live")
            .bearer_auth(&self.config.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let values: Vec<serde_json::Value> = serde_json::from_str(&body)?;
        let slots = values
            .into_iter()
            .map(Slot::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(tour_id = %tour.id, slots = slots.len(), "Availability received");
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(OctoConfig::new("token").validate().is_ok());

        let no_protocol = OctoConfig::new("token").with_base_url("api.example.com");
        assert!(no_protocol.validate().is_err());

        let zero_timeout = OctoConfig::new("token").with_timeout(0);
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_availability_url_trims_slash() {
        let config = OctoConfig::new("token").with_base_url("http://localhost:8080/");
        assert_eq!(config.availability_url(), "http://localhost:8080/octo/availability");
    }

    #[test]
    fn test_request_body_shape() {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .unwrap();
        let request = AvailabilityRequest {
            product_id: Uuid::nil(),
            option_id: "DEFAULT",
            local_date_start: window.start(),
            local_date_end: window.end(),
            currency: "USD",
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["productId"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(value["optionId"], "DEFAULT");
        assert_eq!(value["localDateStart"], "2025-03-01");
        assert_eq!(value["localDateEnd"], "2025-03-31");
        assert_eq!(value["currency"], "USD");
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let result = OctoClient::new(OctoConfig::new("token").with_base_url("ftp://example.com"));
        assert!(matches!(result, Err(FetchError::InvalidConfig(_))));
    }
}
