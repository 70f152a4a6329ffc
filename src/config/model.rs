// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::Flavour;

/// Configuration file as read from TOML, before validation.
///
/// ```toml
/// [server]
/// port = 50051
///
/// [jobs]
/// retention_secs = 86400
///
/// [netlister]
/// command = "/usr/local/bin/vlsir-netlist"
///
/// [[simulator]]
/// path = "/opt/xyce/bin/Xyce"
/// version = "7.8"
/// name = "Xyce"
/// license = "GPL"
/// flavours = ["xyce", "xyce_7_8"]
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub jobs: JobsSection,

    #[serde(default)]
    pub netlister: Option<NetlisterSection>,

    /// Explicit installs merged into the registry (`[[simulator]]`).
    #[serde(default)]
    pub simulator: Vec<StaticInstall>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub jobs: JobsSection,
    pub netlister: Option<NetlisterSection>,
    pub simulator: Vec<StaticInstall>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            server: raw.server,
            jobs: raw.jobs,
            netlister: raw.netlister,
            simulator: raw.simulator,
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Probe `$PATH` for well-known simulators at startup.
    #[serde(default = "default_true")]
    pub find_simulators: bool,

    /// Upper bound on one drain-loop readiness wait.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl ServerSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            find_simulators: true,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// `[jobs]` section: working directories, retention and termination policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsSection {
    /// Parent of every job directory. Defaults to the platform temp dir.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Job directories older than this are removed by the sweeper.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// How often the sweeper runs; `0` disables it.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Optional per-job deadline.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// First signal sent when a job is cancelled or times out.
    #[serde(default = "default_cancel_signal")]
    pub cancel_signal: String,

    /// Time allowed after `cancel_signal` before SIGKILL.
    #[serde(default = "default_cancel_grace_ms")]
    pub cancel_grace_ms: u64,
}

impl JobsSection {
    pub fn root_dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}

impl Default for JobsSection {
    fn default() -> Self {
        Self {
            root: None,
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            timeout_secs: None,
            cancel_signal: default_cancel_signal(),
            cancel_grace_ms: default_cancel_grace_ms(),
        }
    }
}

/// `[netlister]` section: the external tool that turns structured input into
/// simulator netlists.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetlisterSection {
    pub command: PathBuf,

    /// Extra leading arguments, placed before the input file, flavour and
    /// output directory.
    #[serde(default)]
    pub args: Vec<String>,

    /// A run that takes longer is abandoned and the request rejected.
    #[serde(default = "default_netlist_timeout_secs")]
    pub timeout_secs: u64,
}

impl NetlisterSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// One `[[simulator]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticInstall {
    pub path: PathBuf,

    #[serde(default = "default_version")]
    pub version: String,

    pub name: String,

    #[serde(default)]
    pub license: String,

    /// Every flavour this install should answer to.
    pub flavours: Vec<Flavour>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50051
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    10 * 60
}

fn default_cancel_signal() -> String {
    "SIGTERM".to_string()
}

fn default_cancel_grace_ms() -> u64 {
    2000
}

fn default_netlist_timeout_secs() -> u64 {
    300
}

fn default_version() -> String {
    "unknown".to_string()
}
