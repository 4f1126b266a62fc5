//! CLI for the fieldnet request layer.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fieldnet_core::config::{self, FieldnetConfig};
use fieldnet_core::connectivity::{Connectivity, ConnectivityMonitor, TcpProbe};
use fieldnet_core::dispatch::Dispatcher;
use fieldnet_core::store::{OfflineStore, OperationKind};
use fieldnet_core::transport::CurlTransport;
use std::sync::Arc;
use std::time::Duration;

use commands::{
    run_get, run_pending, run_purge, run_status, run_sync, run_watch, run_write, WriteArgs,
};

/// Top-level CLI for fieldnet.
#[derive(Debug, Parser)]
#[command(name = "fieldnet")]
#[command(about = "fieldnet: offline-aware requests against the field assistant backend", long_about = None)]
pub struct Cli {
    /// Treat the device as offline (reads from cache, writes are queued).
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch an endpoint, optionally through the offline cache.
    Get {
        /// Endpoint path (relative to base_url) or absolute URL.
        endpoint: String,
        /// Cache the response under this key and serve it when offline.
        #[arg(long, value_name = "KEY")]
        cache_key: Option<String>,
        /// Maximum age of a cached response, in seconds.
        #[arg(long, value_name = "SECS")]
        max_age_secs: Option<u64>,
    },

    /// POST a body; queued for later sync when offline.
    Post {
        endpoint: String,
        #[command(flatten)]
        write: WriteArgs,
    },

    /// PUT a body; queued for later sync when offline.
    Put {
        endpoint: String,
        #[command(flatten)]
        write: WriteArgs,
    },

    /// DELETE an endpoint; queued for later sync when offline.
    Delete {
        endpoint: String,
        /// Extra request header, "Name: value" (repeatable).
        #[arg(long = "header", short = 'H', value_name = "HEADER")]
        headers: Vec<String>,
    },

    /// Replay queued writes now.
    Sync,

    /// List queued writes that have not been synced.
    Pending,

    /// Show connectivity, cache and queue statistics.
    Status {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Drop old cache entries and synced writes.
    Purge {
        /// Age threshold in seconds (default: purge_after_secs from config).
        #[arg(long, value_name = "SECS")]
        older_than_secs: Option<u64>,
    },

    /// Probe connectivity in the background and sync whenever it comes back, until Ctrl-C.
    Watch,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let initial = initial_connectivity(&cfg, cli.offline).await;
        let (monitor, handle) = ConnectivityMonitor::new(initial);
        let store = OfflineStore::open_default(handle).await?;
        let dispatcher = Arc::new(build_dispatcher(&cfg, store)?);

        match cli.command {
            CliCommand::Get {
                endpoint,
                cache_key,
                max_age_secs,
            } => {
                let max_age = max_age_secs.map(Duration::from_secs);
                run_get(&dispatcher, &endpoint, cache_key.as_deref(), max_age).await?;
            }
            CliCommand::Post { endpoint, write } => {
                run_write(&dispatcher, OperationKind::Post, &endpoint, &write).await?;
            }
            CliCommand::Put { endpoint, write } => {
                run_write(&dispatcher, OperationKind::Put, &endpoint, &write).await?;
            }
            CliCommand::Delete { endpoint, headers } => {
                let write = WriteArgs {
                    body: None,
                    headers,
                };
                run_write(&dispatcher, OperationKind::Delete, &endpoint, &write).await?;
            }
            CliCommand::Sync => run_sync(&dispatcher).await?,
            CliCommand::Pending => run_pending(dispatcher.store()).await?,
            CliCommand::Status { json } => run_status(&dispatcher, json).await?,
            CliCommand::Purge { older_than_secs } => {
                let max_age = older_than_secs
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| cfg.purge_after());
                run_purge(dispatcher.store(), max_age).await?;
            }
            CliCommand::Watch => {
                let probe = backend_probe(&cfg)?;
                run_watch(dispatcher, monitor, probe, cfg.probe_interval()).await?;
            }
        }

        Ok(())
    }
}

/// Forced offline, else one TCP probe of the backend.
pub(crate) async fn initial_connectivity(cfg: &FieldnetConfig, offline: bool) -> Connectivity {
    if offline {
        return Connectivity::Offline;
    }
    match backend_probe(cfg) {
        Ok(probe) => probe.probe_once().await.into(),
        Err(e) => {
            tracing::warn!("cannot probe backend, assuming online: {:#}", e);
            Connectivity::Online
        }
    }
}

pub(crate) fn backend_probe(cfg: &FieldnetConfig) -> Result<TcpProbe> {
    TcpProbe::from_url(&cfg.base_url, Duration::from_secs(cfg.connect_timeout_secs.max(1)))
}

pub(crate) fn build_dispatcher(cfg: &FieldnetConfig, store: OfflineStore) -> Result<Dispatcher> {
    let transport = Arc::new(CurlTransport::new(
        Duration::from_secs(cfg.connect_timeout_secs),
        Duration::from_secs(cfg.request_timeout_secs),
    ));
    Ok(Dispatcher::new(transport, store, &cfg.base_url)?
        .with_presets(cfg.retry_presets())
        .with_first_party_hosts(cfg.first_party_hosts.iter().cloned()))
}

#[cfg(test)]
mod tests;
