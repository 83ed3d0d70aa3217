// src/geo.rs
//! Country lookup for probed peers

use anyhow::Context;
use ipnet::IpNet;
use std::fs;
use std::net::IpAddr;
use std::path::Path;

/// Resolves an IP address to a two-letter country code
pub trait GeoResolver: Send + Sync {
    fn lookup(&self, ip: IpAddr) -> Option<String>;
}

/// Resolver that never knows the answer
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeo;

impl GeoResolver for NoGeo {
    fn lookup(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

/// Static CIDR-to-country table
#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    entries: Vec<(IpNet, String)>,
}

impl GeoTable {
    /// Load a table from a file of `CIDR,CC` lines (`#` starts a comment)
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read geo table {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut entries = Vec::new();

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (cidr, code) = line
                .split_once(',')
                .with_context(|| format!("Geo table line {}: expected CIDR,CC", lineno + 1))?;

            let net: IpNet = cidr
                .trim()
                .parse()
                .with_context(|| format!("Geo table line {}: invalid CIDR '{}'", lineno + 1, cidr))?;

            entries.push((net, code.trim().to_ascii_uppercase()));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeoResolver for GeoTable {
    /// Most specific matching prefix wins
    fn lookup(&self, ip: IpAddr) -> Option<String> {
        self.entries
            .iter()
            .filter(|(net, _)| net.contains(&ip))
            .max_by_key(|(net, _)| net.prefix_len())
            .map(|(_, code)| code.clone())
    }
}
