// src/config.rs

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub enable_ipv6: bool,
    #[serde(default)]
    pub best: usize,            // 0 = collect everything
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
}

fn default_port() -> u16 { 443 }
fn default_threads() -> usize { 2 }
fn default_timeout_secs() -> u64 { 10 }
fn default_wait_secs() -> u64 { 15 }

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            threads: default_threads(),
            timeout_secs: default_timeout_secs(),
            enable_ipv6: false,
            best: 0,
            wait_secs: default_wait_secs(),
        }
    }
}

impl ScanConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_out")]
    pub out: String,            // empty = discard rows
    #[serde(default)]
    pub best_out: Option<String>,
}

fn default_out() -> String { "out.csv".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out: default_out(),
            best_out: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FilterConfig {
    #[serde(default)]
    pub ignore_domains: Option<String>,
    #[serde(default)]
    pub geo_table: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(cfg)
    }

    /// Reject settings that would make the scan meaningless
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scan.threads == 0 {
            anyhow::bail!("thread count must be greater than 0");
        }

        if self.scan.timeout_secs == 0 {
            anyhow::bail!("timeout must be greater than 0");
        }

        if self.scan.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        Ok(())
    }
}
