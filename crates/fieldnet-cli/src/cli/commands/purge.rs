//! `fieldnet purge` – drop old cache entries and synced writes.

use anyhow::Result;
use fieldnet_core::store::OfflineStore;
use std::time::Duration;

pub async fn run_purge(store: &OfflineStore, max_age: Duration) -> Result<()> {
    let report = store.purge_older_than(max_age).await?;
    println!(
        "Purged {} cache entries and {} synced writes older than {}s.",
        report.cache_entries,
        report.synced_operations,
        max_age.as_secs()
    );
    Ok(())
}
