// src/latency.rs
//! Round-trip latency measurement for scan results

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

use crate::types::ScanResult;

/// Measures how far away a discovered server is
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    async fn latency(&self, result: &ScanResult) -> Result<Duration>;
}

/// Latency as the time to complete a TCP connect to the result's IP
#[derive(Debug, Clone)]
pub struct TcpPing {
    port: u16,
    timeout: Duration,
}

impl TcpPing {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

#[async_trait]
impl LatencyProbe for TcpPing {
    async fn latency(&self, result: &ScanResult) -> Result<Duration> {
        let ip: IpAddr = result
            .ip
            .parse()
            .with_context(|| format!("Invalid IP '{}'", result.ip))?;
        let addr = SocketAddr::new(ip, self.port);

        let start = Instant::now();
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(addr))
            .await
            .with_context(|| format!("Connect to {} timed out", addr))?
            .with_context(|| format!("Connect to {} failed", addr))?;
        let elapsed = start.elapsed();

        drop(stream);
        Ok(elapsed)
    }
}
