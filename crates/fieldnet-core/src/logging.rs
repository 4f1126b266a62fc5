//! Tracing setup. Events go to a log file in the XDG state dir; the CLI drops
//! to stderr when that file cannot be opened.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info,fieldnet=debug,fieldnet_core=debug";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `~/.local/state/fieldnet/fieldnet.log`; the directory is created if missing.
pub fn log_file_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("fieldnet")?;
    dirs.place_state_file("fieldnet.log")
        .context("create log directory")
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

/// Install the file subscriber. Returns the log path.
///
/// Fails if the state dir is unwritable or a global subscriber is already set;
/// callers fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = open_append(&path)?;

    tracing_subscriber::registry()
        .with(filter())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("install tracing subscriber")?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(path)
}

/// Stderr-only subscriber. A subscriber that is already installed is left in place.
pub fn init_logging_stderr() {
    let installed = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr))
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
