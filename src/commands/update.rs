use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use tourwatch::storage::TourRepository;
use tourwatch::summary::{collect_latest, SummaryRenderer};
use tourwatch::sync::SyncError;

use super::{cancel_on_ctrl_c, Runtime};

/// Sync every tracked tour once, then print the latest availability table
pub async fn update(rt: &Runtime) -> Result<()> {
    let client = rt.client()?;
    let coordinator = rt.coordinator(client);
    let handler = rt.handler()?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let outcome = coordinator
        .sync_tracked(rt.store.as_ref(), &handler, &cancel)
        .await;

    if let Err(SyncError::ListTours(e)) = &outcome {
        anyhow::bail!("Failed to list tours: {e}");
    }

    let renderer = SummaryRenderer::new().context("Failed to load summary templates")?;
    let tours = rt.store.list_tours().await.context("Failed to list tours")?;
    let entries = collect_latest(tours, rt.store.as_ref())
        .await
        .context("Failed to load latest availability")?;
    print!("{}", renderer.render_latest(&entries)?);

    let report = outcome.context("Update failed")?;
    tracing::info!(
        advanced = report.advanced.len(),
        unchanged = report.unchanged.len(),
        "Update complete"
    );

    Ok(())
}
