//! `fieldnet sync` – replay queued writes now.

use anyhow::Result;
use fieldnet_core::dispatch::Dispatcher;

pub async fn run_sync(dispatcher: &Dispatcher) -> Result<()> {
    if dispatcher.is_offline() {
        println!("Backend unreachable; queued writes will be retried on the next sync.");
    }
    let report = dispatcher.sync_pending().await?;
    println!(
        "Synced {} of {} queued writes ({} still pending).",
        report.synced, report.attempted, report.failed
    );
    Ok(())
}
