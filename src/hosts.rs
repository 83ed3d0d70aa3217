// src/hosts.rs
//! Host enumeration: turns a scan target into a lazy stream of hosts
//!
//! Every source feeds the same bounded channel. The producer task closes the
//! channel when the source is exhausted, or stops early once every receiver
//! is gone.

use anyhow::{Context, Result};
use ipnet::{IpNet, Ipv4AddrRange, Ipv6AddrRange};
use regex::Regex;
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::types::Host;

/// Capacity of the host channel between the producer and the workers
pub const HOST_CHANNEL_CAPACITY: usize = 256;

/// Matches `scheme://host` occurrences in a crawled page
const LINK_PATTERN: &str = r#"(http|https)://(.*?)[/"<>\s]+"#;

/// Where the hosts to scan come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// Single IP, CIDR, or domain
    Addr(String),
    /// File with one IP, CIDR, or domain per line
    File(PathBuf),
    /// Web page to crawl for links
    Url(String),
}

/// Open the target and start producing hosts
///
/// Setup failures (unreadable file, failed fetch) are returned before any
/// host is produced.
pub async fn enumerate(target: &ScanTarget, enable_ipv6: bool) -> Result<mpsc::Receiver<Host>> {
    let (tx, rx) = mpsc::channel(HOST_CHANNEL_CAPACITY);

    match target {
        ScanTarget::Addr(addr) => {
            tokio::spawn(produce_addr(addr.clone(), enable_ipv6, tx));
        }
        ScanTarget::File(path) => {
            let reader = open_lines(path).await?;
            tokio::spawn(produce_lines(reader, enable_ipv6, tx));
        }
        ScanTarget::Url(url) => {
            info!("Fetching url...");
            let domains = crawl(url).await?;
            info!("Parsed {} domains", domains.len());
            let reader = BufReader::new(std::io::Cursor::new(domains.join("\n").into_bytes()));
            tokio::spawn(produce_lines(reader, enable_ipv6, tx));
        }
    }

    Ok(rx)
}

/// Expand one address: a CIDR yields every address in the range, anything
/// else yields itself once
pub fn expand_addr(addr: &str, enable_ipv6: bool) -> Box<dyn Iterator<Item = Host> + Send> {
    let addr = addr.trim();

    if let Ok(net) = addr.parse::<IpNet>() {
        let origin = addr.to_string();
        return match net {
            IpNet::V4(net) => Box::new(
                Ipv4AddrRange::new(net.network(), net.broadcast())
                    .map(move |ip| Host::new(ip.to_string(), origin.clone())),
            ),
            IpNet::V6(net) if enable_ipv6 => Box::new(
                Ipv6AddrRange::new(net.network(), net.broadcast())
                    .map(move |ip| Host::new(ip.to_string(), origin.clone())),
            ),
            IpNet::V6(_) => {
                warn!("Skipping IPv6 range {} (IPv6 disabled)", addr);
                Box::new(std::iter::empty())
            }
        };
    }

    if let Ok(IpAddr::V6(_)) = addr.parse::<IpAddr>() {
        if !enable_ipv6 {
            warn!("Skipping IPv6 address {} (IPv6 disabled)", addr);
            return Box::new(std::iter::empty());
        }
    }

    if addr.is_empty() {
        return Box::new(std::iter::empty());
    }

    Box::new(std::iter::once(Host::bare(addr)))
}

/// Feed the expansion of one address into the channel
async fn produce_addr(addr: String, enable_ipv6: bool, tx: mpsc::Sender<Host>) {
    for host in expand_addr(&addr, enable_ipv6) {
        if tx.send(host).await.is_err() {
            debug!("Host receivers closed, stopping enumeration of {}", addr);
            return;
        }
    }
}

async fn open_lines(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .await
        .with_context(|| format!("Error reading file {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Feed hosts from a line-oriented source into the channel
async fn produce_lines<R>(reader: R, enable_ipv6: bool, tx: mpsc::Sender<Host>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Error reading input, stopping enumeration: {}", e);
                break;
            }
        };

        for host in expand_addr(&line, enable_ipv6) {
            if tx.send(host).await.is_err() {
                debug!("Host receivers closed, stopping enumeration");
                return;
            }
        }
    }
}

/// Fetch a page and extract the distinct hosts it links to
pub async fn crawl(url: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Error fetching url {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Fetching {} failed with status {}", url, response.status());
    }

    let body = response.text().await.context("Error reading body")?;

    extract_domains(&body)
}

/// Extract the host part of every `http(s)://` link, deduplicated
pub fn extract_domains(body: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(LINK_PATTERN).context("Invalid link pattern")?;
    let mut seen = HashSet::new();

    let domains = pattern
        .captures_iter(body)
        .filter_map(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
        .filter(|d| !d.is_empty() && seen.insert(d.clone()))
        .collect();

    Ok(domains)
}
