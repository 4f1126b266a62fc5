use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::{RetryPolicy, RetryPresets};

fn default_multiplier() -> f64 {
    2.0
}

/// Override for one retry preset (optional section in config.toml).
///
/// Only the numbers are configurable; which error kinds a preset retries is fixed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
    /// Growth factor per attempt.
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
    /// Per-attempt deadline in seconds; missing keeps the preset's value.
    #[serde(default)]
    pub attempt_timeout_secs: Option<u64>,
}

impl RetryConfig {
    /// Apply these numbers on top of a preset, keeping its retry predicate.
    pub fn apply_to(&self, mut policy: RetryPolicy) -> RetryPolicy {
        policy.max_attempts = self.max_attempts.max(1);
        policy.base_delay = Duration::from_secs_f64(self.base_delay_secs.max(0.0));
        policy.max_delay = Duration::from_secs(self.max_delay_secs);
        policy.backoff_multiplier = self.backoff_multiplier.max(1.0);
        if let Some(secs) = self.attempt_timeout_secs {
            policy.per_attempt_timeout = Some(Duration::from_secs(secs));
        }
        policy
    }
}

/// Per-preset retry overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetryOverrides {
    #[serde(default)]
    pub network: Option<RetryConfig>,
    #[serde(default)]
    pub api: Option<RetryConfig>,
    #[serde(default)]
    pub critical: Option<RetryConfig>,
}

/// Global configuration loaded from `~/.config/fieldnet/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldnetConfig {
    /// Root of the first-party backend; relative endpoints are joined onto it.
    pub base_url: String,
    /// Extra hosts whose throttling/5xx count as our own server errors.
    #[serde(default)]
    pub first_party_hosts: Vec<String>,
    /// Max age for cached weather reads.
    pub weather_cache_max_age_secs: u64,
    /// `fieldnet purge` default: drop cache and synced writes older than this.
    pub purge_after_secs: u64,
    /// How often the reachability probe runs in `fieldnet watch`.
    pub probe_interval_secs: u64,
    /// Transport connect timeout.
    pub connect_timeout_secs: u64,
    /// Transport whole-request timeout.
    pub request_timeout_secs: u64,
    /// Optional retry overrides; missing sections use built-in presets.
    #[serde(default)]
    pub retry: RetryOverrides,
}

impl Default for FieldnetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            first_party_hosts: Vec::new(),
            weather_cache_max_age_secs: 30 * 60,
            purge_after_secs: 7 * 24 * 60 * 60,
            probe_interval_secs: 15,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            retry: RetryOverrides::default(),
        }
    }
}

impl FieldnetConfig {
    /// Built-in presets with any configured overrides applied.
    pub fn retry_presets(&self) -> RetryPresets {
        let defaults = RetryPresets::default();
        let apply = |cfg: &Option<RetryConfig>, policy: RetryPolicy| match cfg {
            Some(cfg) => cfg.apply_to(policy),
            None => policy,
        };
        RetryPresets {
            network: apply(&self.retry.network, defaults.network),
            api: apply(&self.retry.api, defaults.api),
            critical: apply(&self.retry.critical, defaults.critical),
        }
    }

    pub fn weather_cache_max_age(&self) -> Duration {
        Duration::from_secs(self.weather_cache_max_age_secs)
    }

    pub fn purge_after(&self) -> Duration {
        Duration::from_secs(self.purge_after_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fieldnet")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FieldnetConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<FieldnetConfig> {
    if !path.exists() {
        let default_cfg = FieldnetConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: FieldnetConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
