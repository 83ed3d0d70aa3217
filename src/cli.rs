// src/cli.rs
use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::hosts::ScanTarget;

/// TLS-Scout: discover TLS hosts and the identities they present
///
/// Scans an address, a CIDR range, a list of hosts, or the links of a web page,
/// and records the certificate domain, issuer and country seen at each address.
#[derive(Parser, Debug, Clone)]
#[command(name = "tls-scout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Targets (exactly one) =====
    /// IP, IP CIDR or domain to scan
    #[arg(long = "addr")]
    pub addr: Option<String>,

    /// File with IPs, IP CIDRs or domains to scan, one per line
    #[arg(long = "in")]
    pub input: Option<String>,

    /// Crawl the domain list from a URL, e.g. https://launchpad.net/ubuntu/+archivemirrors
    #[arg(long = "url")]
    pub url: Option<String>,

    // ===== Configuration =====
    /// Path to TOML config file; flags override its values
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    // ===== Scanning =====
    /// HTTPS port to check [default: 443]
    #[arg(long = "port")]
    pub port: Option<u16>,

    /// Count of concurrent tasks [default: 2]
    #[arg(long = "thread")]
    pub threads: Option<usize>,

    /// Timeout in seconds for every check [default: 10]
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Enable IPv6 in addition to IPv4
    #[arg(long = "46")]
    pub enable_ipv6: bool,

    /// Stop after N servers and pick the best of them
    #[arg(long = "best")]
    pub best: Option<usize>,

    /// Stop after this many seconds without a successful check [default: 15]
    #[arg(long = "wait")]
    pub wait: Option<u64>,

    // ===== Output =====
    /// CSV file to store the result, empty to discard [default: out.csv]
    #[arg(long = "out")]
    pub out: Option<String>,

    /// File to store the best server's domain
    #[arg(long = "best-out", alias = "bestOut")]
    pub best_out: Option<String>,

    // ===== Filtering =====
    /// File containing domains to be ignored, one per line
    #[arg(long = "ignore-domains", alias = "ignoreDomains")]
    pub ignore_domains: Option<String>,

    /// File of `CIDR,CC` lines used to resolve country codes
    #[arg(long = "geo-table")]
    pub geo_table: Option<String>,

    // ===== Display & Logging =====
    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// The single scan target; errors unless exactly one of addr/in/url is set
    pub fn target(&self) -> anyhow::Result<ScanTarget> {
        let given = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

        let count = [&self.addr, &self.input, &self.url]
            .into_iter()
            .filter(|v| given(*v))
            .count();

        if count != 1 {
            anyhow::bail!("You must specify one and only one of --addr, --in, or --url");
        }

        if let Some(addr) = self.addr.as_deref().filter(|_| given(&self.addr)) {
            return Ok(ScanTarget::Addr(addr.trim().to_string()));
        }

        if let Some(input) = self.input.as_deref().filter(|_| given(&self.input)) {
            return Ok(ScanTarget::File(PathBuf::from(input)));
        }

        let raw = self.url.as_deref().unwrap_or_default().trim();
        let parsed = url::Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid --url '{}': {}", raw, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("--url must be an http or https URL");
        }

        Ok(ScanTarget::Url(raw.to_string()))
    }

    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        self.target()?;

        if self.threads == Some(0) {
            anyhow::bail!("--thread must be greater than 0");
        }

        if self.timeout == Some(0) {
            anyhow::bail!("--timeout must be greater than 0");
        }

        Ok(())
    }

    /// Apply flags on top of file configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.scan.port = port;
        }
        if let Some(threads) = self.threads {
            config.scan.threads = threads;
        }
        if let Some(timeout) = self.timeout {
            config.scan.timeout_secs = timeout;
        }
        if self.enable_ipv6 {
            config.scan.enable_ipv6 = true;
        }
        if let Some(best) = self.best {
            config.scan.best = best;
        }
        if let Some(wait) = self.wait {
            config.scan.wait_secs = wait;
        }
        if let Some(ref out) = self.out {
            config.output.out = out.clone();
        }
        if let Some(ref best_out) = self.best_out {
            config.output.best_out = Some(best_out.clone());
        }
        if let Some(ref ignore_domains) = self.ignore_domains {
            config.filter.ignore_domains = Some(ignore_domains.clone());
        }
        if let Some(ref geo_table) = self.geo_table {
            config.filter.geo_table = Some(geo_table.clone());
        }
    }

    /// Log level: verbose wins, otherwise the configured level
    pub fn log_level<'a>(&self, config: &'a Config) -> &'a str {
        if self.verbose {
            "debug"
        } else {
            &config.logging.level
        }
    }

    /// Check if progress indicator should be enabled
    pub fn should_show_progress(&self, is_terminal: bool) -> bool {
        !self.no_progress && is_terminal
    }
}
