//! Configuration management for tourwatch
//!
//! Settings come from, in increasing priority: built-in defaults, a TOML file
//! or environment variables, then command-line flags.
//!
//! Environment variables use the `TOURWATCH_` prefix; the unprefixed names
//! `ACCESS_TOKEN`, `DB`, `PUSHOVER_APP_TOKEN` and `PUSHOVER_RECIPIENT_TOKEN`
//! are accepted as fallbacks.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::availability::octo::{OctoConfig, DEFAULT_BASE_URL};
use crate::notifications::{
    Notifier, PushoverConfig, PushoverNotifier, WebhookConfig, WebhookNotifier,
};
use crate::scheduler::parse_interval;
use crate::storage::sqlite::IN_MEMORY;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Booking API configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Notification channels
    pub notify: NotifyConfig,

    /// Watch loop configuration
    pub watch: WatchConfig,

    /// HTTP API server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Booking API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// OCTO API host
    pub base_url: String,

    /// Bearer token for the API
    pub access_token: Option<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path, or `:memory:`
    pub path: String,
}

/// Notification configuration; each channel is enabled by its credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub pushover_app_token: Option<String>,
    pub pushover_recipient_token: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_token: Option<String>,
}

/// Watch loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Tick interval, e.g. `15s`, `5m`, `1h`
    pub interval: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address; `:7077` binds every interface
    pub addr: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: IN_MEMORY.to_string(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: String::from("15s"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: String::from(":7077"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, fallback: Option<&str>| {
            lookup(&format!("TOURWATCH_{name}"))
                .or_else(|| fallback.and_then(|name| lookup(name)))
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let request_timeout_secs = match var("REQUEST_TIMEOUT", None) {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("Invalid TOURWATCH_REQUEST_TIMEOUT: {v}"))?,
            None => defaults.api.request_timeout_secs,
        };

        let debug = var("DEBUG", Some("DEBUG")).is_some_and(|v| v == "true" || v == "1");
        let level = if debug {
            String::from("debug")
        } else {
            var("LOG_LEVEL", None).unwrap_or(defaults.logging.level)
        };

        Ok(Self {
            api: ApiConfig {
                base_url: var("API_URL", None).unwrap_or(defaults.api.base_url),
                access_token: var("ACCESS_TOKEN", Some("ACCESS_TOKEN")),
                request_timeout_secs,
            },
            database: DatabaseConfig {
                path: var("DB", Some("DB")).unwrap_or(defaults.database.path),
            },
            notify: NotifyConfig {
                pushover_app_token: var("PUSHOVER_APP_TOKEN", Some("PUSHOVER_APP_TOKEN")),
                pushover_recipient_token: var(
                    "PUSHOVER_RECIPIENT_TOKEN",
                    Some("PUSHOVER_RECIPIENT_TOKEN"),
                ),
                webhook_url: var("WEBHOOK_URL", None),
                webhook_token: var("WEBHOOK_TOKEN", None),
            },
            watch: WatchConfig {
                interval: var("INTERVAL", None).unwrap_or(defaults.watch.interval),
            },
            server: ServerConfig {
                addr: var("ADDR", None).unwrap_or(defaults.server.addr),
            },
            logging: LoggingConfig {
                level,
                format: var("LOG_FORMAT", None).unwrap_or(defaults.logging.format),
            },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.watch_interval()?;
        self.listen_addr()?;

        if self.api.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        let pushover = (
            &self.notify.pushover_app_token,
            &self.notify.pushover_recipient_token,
        );
        if pushover.0.is_some() != pushover.1.is_some() {
            anyhow::bail!("pushover needs both an app token and a recipient token");
        }

        Ok(())
    }

    /// Parsed watch interval
    pub fn watch_interval(&self) -> Result<Duration> {
        let interval = parse_interval(&self.watch.interval)?;
        if interval.is_zero() {
            anyhow::bail!("watch interval must be greater than 0");
        }
        Ok(interval)
    }

    /// Listen address; a bare `:port` binds every interface
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = &self.server.addr;
        let full = if addr.starts_with(':') {
            format!("0.0.0.0{addr}")
        } else {
            addr.clone()
        };
        full.parse()
            .with_context(|| format!("Invalid listen address: {addr}"))
    }

    /// OCTO client settings; requires an access token
    pub fn octo_config(&self) -> Result<OctoConfig> {
        let token = self
            .api
            .access_token
            .clone()
            .context("an API access token is required (--access-token or ACCESS_TOKEN)")?;

        Ok(OctoConfig::new(token)
            .with_base_url(self.api.base_url.clone())
            .with_timeout(self.api.request_timeout_secs))
    }

    /// Build every notifier whose credentials are configured
    pub fn notifiers(&self) -> Result<Vec<Arc<dyn Notifier>>> {
        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

        if let (Some(app), Some(recipient)) = (
            &self.notify.pushover_app_token,
            &self.notify.pushover_recipient_token,
        ) {
            let notifier = PushoverNotifier::new(PushoverConfig::new(app, recipient))
                .context("Failed to configure Pushover")?;
            notifiers.push(Arc::new(notifier));
        }

        if let Some(url) = &self.notify.webhook_url {
            let mut config = WebhookConfig::new(url);
            if let Some(token) = &self.notify.webhook_token {
                config = config.with_auth_token(token);
            }
            let notifier = WebhookNotifier::new(config).context("Failed to configure webhook")?;
            notifiers.push(Arc::new(notifier));
        }

        Ok(notifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.watch_interval().unwrap(), Duration::from_secs(15));
        assert_eq!(config.listen_addr().unwrap().port(), 7077);
    }

    #[test]
    fn test_env_prefers_prefixed_names() {
        let config = Config::from_lookup(lookup(&[
            ("TOURWATCH_ACCESS_TOKEN", "prefixed"),
            ("ACCESS_TOKEN", "legacy"),
            ("DB", "tours.db"),
        ]))
        .unwrap();

        assert_eq!(config.api.access_token.as_deref(), Some("prefixed"));
        assert_eq!(config.database.path, "tours.db");
    }

    #[test]
    fn test_env_debug_raises_level() {
        let config = Config::from_lookup(lookup(&[("DEBUG", "true")])).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_rejects_bad_timeout() {
        let result = Config::from_lookup(lookup(&[("TOURWATCH_REQUEST_TIMEOUT", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tourwatch.toml");
        std::fs::write(
            &path,
            r#"
                [database]
                path = "/var/lib/tourwatch/tours.db"

                [watch]
                interval = "5m"

                [notify]
                webhook_url = "https://hooks.example.com/tours"
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.database.path, "/var/lib/tourwatch/tours.db");
        assert_eq!(config.watch_interval().unwrap(), Duration::from_secs(300));
        assert_eq!(config.server.addr, ":7077");
        assert_eq!(config.notifiers().unwrap().len(), 1);
    }

    #[test]
    fn test_validate_rejects_half_pushover() {
        let mut config = Config::default();
        config.notify.pushover_app_token = Some("app".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.watch.interval = "0s".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_octo_config_requires_token() {
        assert!(Config::default().octo_config().is_err());

        let mut config = Config::default();
        config.api.access_token = Some("token".to_string());
        let octo = config.octo_config().unwrap();
        assert_eq!(octo.access_token, "token");
        assert_eq!(octo.timeout_secs, Some(30));
    }

    #[test]
    fn test_explicit_listen_addr() {
        let mut config = Config::default();
        config.server.addr = "127.0.0.1:8080".to_string();
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:8080");

        config.server.addr = "nowhere".to_string();
        assert!(config.listen_addr().is_err());
    }
}
