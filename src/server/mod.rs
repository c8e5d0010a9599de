//! HTTP API server
//!
//! Exposes the tracked tours over a small REST interface together with the
//! text summaries, Prometheus metrics and a health probe.
//!
//! # Example
//!
//! ```rust,ignore
//! let state = AppState::new(repo, store, source, metrics)?;
//! server::serve(addr, state, cancel.clone().cancelled_owned()).await?;
//! ```

pub mod api;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::availability::AvailabilitySource;
use crate::metrics::Metrics;
use crate::storage::{SharedAvailabilityStore, SharedTourRepository};
use crate::summary::{SummaryError, SummaryRenderer};
use crate::sync::TourUpdater;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Tracked tours
    pub repo: SharedTourRepository,

    /// Latest known availability per tour
    pub store: SharedAvailabilityStore,

    /// Booking API used for slot tables
    pub source: Arc<dyn AvailabilitySource>,

    /// Runs an immediate update when a tour is created or changed
    pub updater: Arc<TourUpdater>,

    pub metrics: Metrics,

    pub renderer: Arc<SummaryRenderer>,

    /// Cancels updates still running when the server shuts down
    pub cancel: CancellationToken,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        repo: SharedTourRepository,
        store: SharedAvailabilityStore,
        source: Arc<dyn AvailabilitySource>,
        metrics: Metrics,
    ) -> Result<Self, SummaryError> {
        let updater = Arc::new(TourUpdater::new(source.clone(), store.clone()));

        Ok(Self {
            repo,
            store,
            source,
            updater,
            metrics,
            renderer: Arc::new(SummaryRenderer::new()?),
            cancel: CancellationToken::new(),
            start_time: Instant::now(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Build the router with CORS and request tracing
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on `addr` until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "API server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}
