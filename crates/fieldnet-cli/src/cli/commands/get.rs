//! `fieldnet get` – fetch an endpoint, cache-aware.

use anyhow::Result;
use fieldnet_core::dispatch::Dispatcher;
use std::io::Write;
use std::time::Duration;

pub async fn run_get(
    dispatcher: &Dispatcher,
    endpoint: &str,
    cache_key: Option<&str>,
    max_age: Option<Duration>,
) -> Result<()> {
    let body = dispatcher.get(endpoint, cache_key, max_age).await?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&body)?;
    if !body.ends_with(b"\n") {
        writeln!(stdout)?;
    }
    Ok(())
}
