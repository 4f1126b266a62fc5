//! `fieldnet status` – connectivity and offline store statistics.

use anyhow::Result;
use fieldnet_core::dispatch::Dispatcher;

pub async fn run_status(dispatcher: &Dispatcher, json: bool) -> Result<()> {
    let stats = dispatcher.cache_statistics().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    let state = if stats.is_online { "online" } else { "offline" };
    let last_sync = stats
        .last_sync
        .map(|ms| format!("{ms} (unix ms)"))
        .unwrap_or_else(|| "never".to_string());
    println!("connectivity:   {state}");
    println!("cached reads:   {}", stats.cached_read_count);
    println!("pending writes: {}", stats.pending_write_count);
    println!("last sync:      {last_sync}");
    Ok(())
}
