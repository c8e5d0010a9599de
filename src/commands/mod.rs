mod details;
mod load;
mod search;
mod serve;
mod update;
mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use tourwatch::availability::{AvailabilitySource, OctoClient};
use tourwatch::config::Config;
use tourwatch::metrics::Metrics;
use tourwatch::storage::SqliteStore;
use tourwatch::sync::{NotifyOnAdvance, SyncCoordinator, TourUpdater};

pub use details::details;
pub use load::load;
pub use search::search;
pub use serve::serve;
pub use update::update;
pub use watch::watch;

/// Resources shared by every command, built from the resolved configuration
pub struct Runtime {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub metrics: Metrics,
}

impl Runtime {
    pub fn open(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let store = SqliteStore::open(&config.database.path)
            .with_context(|| format!("Failed to open database: {}", config.database.path))?;
        let metrics = Metrics::new().context("Failed to create metrics registry")?;

        Ok(Self {
            config,
            store: Arc::new(store),
            metrics,
        })
    }

    /// OCTO client built from the API settings
    pub fn client(&self) -> Result<Arc<OctoClient>> {
        let client = OctoClient::new(self.config.octo_config()?)
            .context("Failed to create availability client")?;
        Ok(Arc::new(client))
    }

    pub fn coordinator(&self, source: Arc<dyn AvailabilitySource>) -> SyncCoordinator {
        let updater = Arc::new(TourUpdater::new(source, self.store.clone()));
        SyncCoordinator::new(updater).with_metrics(self.metrics.clone())
    }

    /// Advance handler notifying every configured channel
    pub fn handler(&self) -> Result<NotifyOnAdvance> {
        let notifiers = self.config.notifiers()?;
        if notifiers.is_empty() {
            tracing::warn!("No notification channel configured; advances will only be logged");
        }
        Ok(NotifyOnAdvance::new(notifiers).with_metrics(self.metrics.clone()))
    }
}

/// Cancel `token` on Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
                    Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
                }
                token.cancel();
            }
        }
    });
}
