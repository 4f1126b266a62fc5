//! `fieldnet post|put|delete` – writes that fall back to the offline queue.

use anyhow::{bail, Result};
use clap::Args;
use fieldnet_core::dispatch::{Dispatcher, WriteOptions, WriteOutcome};
use fieldnet_core::store::OperationKind;

#[derive(Debug, Clone, Args)]
pub struct WriteArgs {
    /// Request body (sent as JSON unless a Content-Type header is given).
    #[arg(long)]
    pub body: Option<String>,
    /// Extra request header, "Name: value" (repeatable).
    #[arg(long = "header", short = 'H', value_name = "HEADER")]
    pub headers: Vec<String>,
}

impl WriteArgs {
    pub fn to_options(&self) -> Result<WriteOptions> {
        let mut opts = WriteOptions::default();
        for raw in &self.headers {
            let Some((name, value)) = raw.split_once(':') else {
                bail!("invalid header {raw:?}, expected \"Name: value\"");
            };
            let name = name.trim();
            if name.is_empty() {
                bail!("invalid header {raw:?}, empty name");
            }
            opts = opts.header(name, value.trim());
        }
        let has_content_type = opts
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("content-type"));
        if self.body.is_some() && !has_content_type {
            opts = opts.header("Content-Type", "application/json");
        }
        Ok(opts)
    }
}

pub async fn run_write(
    dispatcher: &Dispatcher,
    kind: OperationKind,
    endpoint: &str,
    args: &WriteArgs,
) -> Result<()> {
    let opts = args.to_options()?;
    let body = args.body.as_deref().map(str::as_bytes);
    match dispatcher.send_write(kind, endpoint, body, &opts).await? {
        WriteOutcome::Completed(response) => {
            if !response.is_empty() {
                println!("{}", String::from_utf8_lossy(&response));
            }
        }
        WriteOutcome::Queued(id) => {
            println!("offline: {} {} queued as {}", kind.as_str(), endpoint, id);
        }
    }
    Ok(())
}
