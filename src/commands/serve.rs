use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use tourwatch::server::{self, AppState};

use super::watch::run_watch;
use super::{cancel_on_ctrl_c, Runtime};

/// Run the HTTP API and the watch loop until Ctrl-C or until either fails
pub async fn serve(rt: &Runtime, addr: SocketAddr, interval: Duration) -> Result<()> {
    let client = rt.client()?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let state = AppState::new(
        rt.store.clone(),
        rt.store.clone(),
        client.clone(),
        rt.metrics.clone(),
    )
    .context("Failed to initialize API state")?
    .with_cancel(cancel.child_token());

    let api = async {
        let shutdown = cancel.clone();
        let result = server::serve(addr, state, async move { shutdown.cancelled().await })
            .await
            .with_context(|| format!("API server on {addr} failed"));
        cancel.cancel();
        result
    };

    let watcher = async {
        let result = run_watch(rt, client.clone(), interval, &cancel).await;
        cancel.cancel();
        result
    };

    let (api_result, watch_result) = tokio::join!(api, watcher);
    join_errors(api_result, watch_result)
}

fn join_errors(first: Result<()>, second: Result<()>) -> Result<()> {
    match (first, second) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Err(a), Err(b)) => Err(anyhow::anyhow!("{a:#}\n{b:#}")),
    }
}
