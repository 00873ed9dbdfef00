use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first one fails.
    pub retry_count: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_count: 2,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

/// HTTP transfer settings (`[http]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Absolute cap per request. Generous: lecture videos can be very large.
    pub timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// Extra request headers, e.g. `Authorization`.
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 4 * 3600,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            headers: BTreeMap::new(),
        }
    }
}

/// Global configuration loaded from `~/.config/cbackup/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Preferred video resolution; 0 picks the highest available.
    pub resolution: u32,
    /// Number of concurrent download workers.
    pub workers: usize,
    /// Skip items whose destination already exists.
    pub restart: bool,
    /// Download caption files.
    pub subtitles: bool,
    /// Root of the mirrored tree.
    pub output_dir: PathBuf,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
    pub http: HttpConfig,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            resolution: 0,
            workers: default_workers(),
            restart: false,
            subtitles: false,
            output_dir: PathBuf::from("."),
            retry: None,
            http: HttpConfig::default(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Read-only parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub resolution: u32,
    pub workers: usize,
    pub retry_count: u32,
    pub restart: bool,
    pub subtitles: bool,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        BackupConfig::default().run_config()
    }
}

impl BackupConfig {
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry_config())
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            resolution: self.resolution,
            workers: self.workers.max(1),
            retry_count: self.retry_config().retry_count,
            restart: self.restart,
            subtitles: self.subtitles,
            output_dir: self.output_dir.clone(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cbackup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from `path`.
pub fn load_from_path(path: &Path) -> Result<BackupConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: BackupConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Render `cfg` as it would be written to `config.toml`.
pub fn to_toml(cfg: &BackupConfig) -> Result<String> {
    toml::to_string_pretty(cfg).context("failed to serialize config")
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BackupConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BackupConfig::default();
        let toml = to_toml(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}
