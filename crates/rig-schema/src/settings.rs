//! Run configuration carried in the `[settings]` table of a catalog file.
//!
//! Every field has a default so a catalog may omit the table entirely.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// How the coordinator schedules installation pipelines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One pipeline at a time, in selection order, with progress reporting.
    Sequential,
    /// Up to `max_parallel` pipelines at once.
    #[default]
    Parallel,
}

/// Bounds for one retried operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrySetting {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Ceiling for the doubled delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl RetrySetting {
    /// Build a retry setting from its three bounds.
    pub const fn new(max_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
        }
    }
}

/// A retry table as written; absent bounds come from the operation's default.
#[derive(Deserialize)]
struct PartialRetry {
    max_attempts: Option<u32>,
    initial_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

impl PartialRetry {
    fn over(self, base: RetrySetting) -> RetrySetting {
        RetrySetting {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            initial_delay_ms: self.initial_delay_ms.unwrap_or(base.initial_delay_ms),
            max_delay_ms: self.max_delay_ms.unwrap_or(base.max_delay_ms),
        }
    }
}

fn manager_retry<'de, D: Deserializer<'de>>(d: D) -> Result<RetrySetting, D::Error> {
    Ok(PartialRetry::deserialize(d)?.over(RetrySettings::default().manager))
}

fn download_retry<'de, D: Deserializer<'de>>(d: D) -> Result<RetrySetting, D::Error> {
    Ok(PartialRetry::deserialize(d)?.over(RetrySettings::default().download))
}

fn bootstrap_retry<'de, D: Deserializer<'de>>(d: D) -> Result<RetrySetting, D::Error> {
    Ok(PartialRetry::deserialize(d)?.over(RetrySettings::default().bootstrap))
}

/// Per-operation retry bounds.
///
/// Each table may be partial: `[settings.retry.manager] max_attempts = 5`
/// keeps the default delays for manager installs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    /// Package manager installs.
    #[serde(deserialize_with = "manager_retry")]
    pub manager: RetrySetting,
    /// Direct downloads (per URL).
    #[serde(deserialize_with = "download_retry")]
    pub download: RetrySetting,
    /// Package manager bootstrap.
    #[serde(deserialize_with = "bootstrap_retry")]
    pub bootstrap: RetrySetting,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            manager: RetrySetting::new(3, 2_000, 30_000),
            download: RetrySetting::new(3, 2_000, 30_000),
            bootstrap: RetrySetting::new(5, 5_000, 60_000),
        }
    }
}

/// Command template used to drive a package manager client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagerCommand {
    /// Client executable, looked up on `PATH`.
    pub program: String,
    /// Install arguments; `{id}` is replaced with the application's identifier.
    pub install_args: Vec<String>,
    /// Command that installs the client itself, if it can be bootstrapped.
    #[serde(default)]
    pub bootstrap: Vec<String>,
}

/// A manager table as written; absent keys come from that manager's default.
#[derive(Deserialize)]
struct PartialManager {
    program: Option<String>,
    install_args: Option<Vec<String>>,
    bootstrap: Option<Vec<String>>,
}

impl PartialManager {
    fn over(self, base: ManagerCommand) -> ManagerCommand {
        ManagerCommand {
            program: self.program.unwrap_or(base.program),
            install_args: self.install_args.unwrap_or(base.install_args),
            bootstrap: self.bootstrap.unwrap_or(base.bootstrap),
        }
    }
}

fn primary_manager<'de, D: Deserializer<'de>>(d: D) -> Result<ManagerCommand, D::Error> {
    Ok(PartialManager::deserialize(d)?.over(ManagerCommand::default_primary()))
}

fn secondary_manager<'de, D: Deserializer<'de>>(d: D) -> Result<ManagerCommand, D::Error> {
    Ok(PartialManager::deserialize(d)?.over(ManagerCommand::default_secondary()))
}

impl ManagerCommand {
    /// Render the install arguments for one package identifier.
    pub fn render_install_args(&self, id: &str) -> Vec<String> {
        self.install_args
            .iter()
            .map(|arg| arg.replace("{id}", id))
            .collect()
    }

    fn default_primary() -> Self {
        Self {
            program: "winget".to_string(),
            install_args: [
                "install",
                "--id",
                "{id}",
                "-e",
                "--silent",
                "--accept-package-agreements",
                "--accept-source-agreements",
            ]
            .map(String::from)
            .to_vec(),
            bootstrap: Vec::new(),
        }
    }

    fn default_secondary() -> Self {
        Self {
            program: "choco".to_string(),
            install_args: ["install", "{id}", "-y", "--no-progress"]
                .map(String::from)
                .to_vec(),
            bootstrap: [
                "powershell",
                "-NoProfile",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                "[System.Net.ServicePointManager]::SecurityProtocol = 3072; \
                 iex ((New-Object System.Net.WebClient).DownloadString('https://community.chocolatey.org/install.ps1'))",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Thresholds for the advisory environment checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreflightSettings {
    /// Minimum OS version as a dotted number (e.g. `10.0.17763`).
    pub min_os_version: Option<String>,
    /// Minimum free disk space on the system volume, in GiB.
    pub min_free_disk_gb: u64,
    /// Minimum free physical memory, in MiB.
    pub min_free_memory_mb: u64,
    /// Endpoint probed to confirm network reachability.
    pub network_probe_url: String,
}

impl Default for PreflightSettings {
    fn default() -> Self {
        Self {
            min_os_version: None,
            min_free_disk_gb: 10,
            min_free_memory_mb: 2048,
            network_probe_url: "https://www.microsoft.com".to_string(),
        }
    }
}

/// Run configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Sequential or parallel scheduling.
    pub mode: RunMode,
    /// Upper bound on concurrently running pipelines in parallel mode.
    pub max_parallel: usize,
    /// Retry bounds per operation kind.
    pub retry: RetrySettings,
    /// Timeout applied to every network request, in seconds.
    pub download_timeout_secs: u64,
    /// Timeout for installer subprocesses; `None` waits for as long as the installer runs.
    pub install_timeout_secs: Option<u64>,
    /// Rough per-application duration used for the pre-run estimate.
    pub estimate_per_app_secs: u64,
    /// Open the vendor page for applications that need a manual download.
    pub open_browser: bool,
    /// Primary package manager (tried first).
    #[serde(deserialize_with = "primary_manager")]
    pub manager_a: ManagerCommand,
    /// Secondary package manager (bootstrapped if missing).
    #[serde(deserialize_with = "secondary_manager")]
    pub manager_b: ManagerCommand,
    /// Advisory environment checks.
    pub preflight: PreflightSettings,
    /// Commands run once after all installations finish.
    pub post_install: Vec<Vec<String>>,
    /// Run log location; defaults to `$RIG_HOME/logs/rig.log`.
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            max_parallel: 3,
            retry: RetrySettings::default(),
            download_timeout_secs: 300,
            install_timeout_secs: None,
            estimate_per_app_secs: 90,
            open_browser: true,
            manager_a: ManagerCommand::default_primary(),
            manager_b: ManagerCommand::default_secondary(),
            preflight: PreflightSettings::default(),
            post_install: Vec::new(),
            log_file: None,
        }
    }
}

impl Settings {
    /// Effective concurrency bound, never below one.
    pub fn parallelism(&self) -> usize {
        self.max_parallel.max(1)
    }
}
