//! `fieldnet watch` – probe the backend and sync on every reconnect until Ctrl-C.

use anyhow::Result;
use fieldnet_core::connectivity::{ConnectivityMonitor, TcpProbe};
use fieldnet_core::dispatch::{spawn_sync_on_reconnect, Dispatcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub async fn run_watch(
    dispatcher: Arc<Dispatcher>,
    monitor: ConnectivityMonitor,
    probe: TcpProbe,
    interval: Duration,
) -> Result<()> {
    println!(
        "Watching {} every {}s (Ctrl-C to stop).",
        probe.addr(),
        interval.as_secs()
    );

    let (tx, mut events) = mpsc::channel(8);
    let probe_task = probe.spawn(interval, tx);
    let sync_task = spawn_sync_on_reconnect(Arc::clone(&dispatcher));

    if dispatcher.is_online() {
        let report = dispatcher.sync_pending().await?;
        if report.attempted > 0 {
            println!("Synced {} of {} queued writes.", report.synced, report.attempted);
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(kind) => {
                    if monitor.apply(kind) {
                        let state = if dispatcher.is_online() { "online" } else { "offline" };
                        println!("connectivity: {state}");
                    }
                }
                None => break,
            },
            res = &mut ctrl_c => {
                res?;
                break;
            }
        }
    }

    probe_task.abort();
    // Closing the monitor ends the sync task once any running pass finishes.
    drop(monitor);
    if let Err(e) = sync_task.await {
        tracing::warn!("sync task ended abnormally: {e}");
    }
    Ok(())
}
