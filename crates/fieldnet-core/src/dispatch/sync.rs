use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::Dispatcher;
use crate::connectivity::Connectivity;

/// Summary of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
    /// When the pass finished (Unix ms); `None` if the marker could not be stored.
    pub finished_at: Option<i64>,
}

impl Dispatcher {
    /// Replay every pending write in FIFO order.
    ///
    /// Each operation is sent once through the api policy without offline
    /// save; a success marks it synced, a failure leaves it pending and the
    /// pass moves on. A store error on one operation counts it as failed.
    /// The last-sync marker is written at the end of every pass. Overlapping calls run one after the other, so a second
    /// pass only sees what the first left behind.
    pub async fn sync_pending(&self) -> Result<SyncReport> {
        let _pass = self.sync_guard.lock().await;
        let pending = self.store.pending_operations().await?;
        let mut report = SyncReport::default();

        for op in pending {
            report.attempted += 1;
            let result = self
                .send_with_retry(
                    &self.presets.api,
                    op.kind.method(),
                    &op.endpoint,
                    op.body.as_deref(),
                    &op.headers,
                )
                .await;
            match result {
                Ok(_) => match self.store.mark_synced(&op.id).await {
                    Ok(()) => {
                        report.synced += 1;
                        tracing::debug!(id = %op.id, endpoint = %op.endpoint, "replayed queued write");
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            id = %op.id,
                            endpoint = %op.endpoint,
                            "replayed but could not mark synced: {e:#}"
                        );
                    }
                },
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        id = %op.id,
                        endpoint = %op.endpoint,
                        kind = %err.kind(),
                        "replay failed, keeping queued: {}",
                        err.message()
                    );
                }
            }
        }

        report.finished_at = match self.store.record_sync().await {
            Ok(at) => Some(at),
            Err(e) => {
                tracing::warn!("could not record last sync: {e:#}");
                None
            }
        };
        tracing::info!(
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failed,
            "sync pass finished"
        );
        Ok(report)
    }
}

/// Run [`Dispatcher::sync_pending`] on every offline→online transition.
/// The task ends when the connectivity monitor goes away.
pub fn spawn_sync_on_reconnect(dispatcher: Arc<Dispatcher>) -> JoinHandle<()> {
    let mut rx = dispatcher.store().connectivity().subscribe();
    // Seen before spawning so a transition racing the spawn is not lost.
    let mut previous = *rx.borrow_and_update();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let current = *rx.borrow_and_update();
            if previous == Connectivity::Offline && current == Connectivity::Online {
                tracing::info!("back online, syncing queued writes");
                if let Err(e) = dispatcher.sync_pending().await {
                    tracing::warn!("sync pass failed: {e:#}");
                }
            }
            previous = current;
        }
        tracing::debug!("connectivity monitor closed, sync task exiting");
    })
}
