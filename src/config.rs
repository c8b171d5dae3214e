use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub capture: CaptureSettings,
}

/// Monitor core tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Max age (seconds) of an unmatched correlation entry
    #[serde(default = "default_rtd_max_age")]
    pub rtd_max_age: f64,

    /// Flows idle longer than this (seconds) are forgotten
    #[serde(default = "default_flow_max_idle")]
    pub flow_max_idle: f64,

    /// Summary report interval in seconds; 0 disables summaries
    #[serde(default = "default_sum_interval")]
    pub sum_interval: f64,

    /// Maximum concurrent flow records
    #[serde(default = "default_max_flows")]
    pub max_flows: usize,

    /// Suppress observations without a delay sample
    #[serde(default)]
    pub quick: bool,

    /// Skip correlation inserts for traffic addressed to the local host
    #[serde(default = "default_true")]
    pub filter_local: bool,

    /// Sequence deltas larger than this are treated as 32-bit wrap
    #[serde(default = "default_seq_wrap_threshold")]
    pub seq_wrap_threshold: u32,

    /// Stop after this many capture seconds (0 = no limit)
    #[serde(default)]
    pub time_to_run: f64,

    /// Stop after this many packets (0 = no limit)
    #[serde(default)]
    pub max_packets: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            rtd_max_age: default_rtd_max_age(),
            flow_max_idle: default_flow_max_idle(),
            sum_interval: default_sum_interval(),
            max_flows: default_max_flows(),
            quick: false,
            filter_local: true,
            seq_wrap_threshold: default_seq_wrap_threshold(),
            time_to_run: 0.0,
            max_packets: 0,
        }
    }
}

/// Capture-layer tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Snapshot length; headers plus options fit in the default
    #[serde(default = "default_snaplen")]
    pub snaplen: i32,

    /// Live read timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i32,

    /// Enable promiscuous mode on live captures
    #[serde(default)]
    pub promiscuous: bool,

    /// Base BPF filter; user expressions are ANDed onto it
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            snaplen: default_snaplen(),
            timeout_ms: default_timeout_ms(),
            promiscuous: false,
            filter: default_filter(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

fn default_rtd_max_age() -> f64 {
    10.0
}

fn default_flow_max_idle() -> f64 {
    300.0
}

fn default_sum_interval() -> f64 {
    10.0
}

fn default_max_flows() -> usize {
    10_000
}

fn default_seq_wrap_threshold() -> u32 {
    1 << 29
}

fn default_true() -> bool {
    true
}

fn default_snaplen() -> i32 {
    144
}

fn default_timeout_ms() -> i32 {
    250
}

fn default_filter() -> String {
    "tcp".to_string()
}
