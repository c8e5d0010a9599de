use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use tourwatch::availability::AvailabilitySource;
use tourwatch::scheduler::Scheduler;

use super::{cancel_on_ctrl_c, Runtime};

/// Sync every tracked tour on each aligned tick until Ctrl-C
pub async fn watch(rt: &Runtime, interval: Duration) -> Result<()> {
    let client = rt.client()?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    run_watch(rt, client, interval, &cancel).await
}

/// Watch loop shared with `serve`; returns `Ok` once `cancel` fires
pub(super) async fn run_watch(
    rt: &Runtime,
    source: Arc<dyn AvailabilitySource>,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    let scheduler = Scheduler::new(interval)
        .context("Invalid watch interval")?
        .with_metrics(rt.metrics.clone());
    let coordinator = rt.coordinator(source);
    let handler = rt.handler()?;

    let coordinator = &coordinator;
    let handler = &handler;
    let repo = rt.store.as_ref();

    let result = scheduler
        .run(cancel, move || async move {
            let report = coordinator.sync_tracked(repo, handler, cancel).await?;
            tracing::info!(
                advanced = report.advanced.len(),
                unchanged = report.unchanged.len(),
                "Sync complete"
            );
            Ok::<(), tourwatch::sync::SyncError>(())
        })
        .await;

    match result {
        Err(e) if e.is_cancelled() => Ok(()),
        other => other.context("Watch loop failed"),
    }
}
