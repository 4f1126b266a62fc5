//! `fieldnet pending` – list unsynced writes.

use anyhow::Result;
use fieldnet_core::store::OfflineStore;

pub async fn run_pending(store: &OfflineStore) -> Result<()> {
    let ops = store.pending_operations().await?;
    if ops.is_empty() {
        println!("No queued writes.");
        return Ok(());
    }
    println!("{:<27} {:<7} {:<8} {}", "ID", "KIND", "BYTES", "ENDPOINT");
    for op in ops {
        let size = op
            .body
            .as_ref()
            .map(|b| b.len().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<27} {:<7} {:<8} {}",
            op.id,
            op.kind.as_str(),
            size,
            op.endpoint
        );
    }
    Ok(())
}
