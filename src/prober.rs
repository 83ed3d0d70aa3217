// src/prober.rs
//! Single-handshake TLS prober

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::cert_parser::{CertIdentity, CertificateParser};
use crate::geo::GeoResolver;
use crate::output::SinkHandle;
use crate::stats::{ProbeOutcome, ProbeStats};
use crate::types::{Host, ScanResult};

/// Something that can probe one host and report what it saw
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe a host; `None` means the host yielded nothing usable
    async fn probe(&self, host: &Host) -> Option<ScanResult>;
}

/// Why a probe produced no result
#[derive(Debug)]
enum ProbeFailure {
    Connect(io::Error),
    ConnectTimeout,
    Handshake(native_tls::Error),
    HandshakeTimeout,
}

impl ProbeFailure {
    fn outcome(&self) -> ProbeOutcome {
        match self {
            Self::Connect(_) => ProbeOutcome::ConnectFailed,
            Self::ConnectTimeout | Self::HandshakeTimeout => ProbeOutcome::TimedOut,
            Self::Handshake(_) => ProbeOutcome::HandshakeFailed,
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "connect failed: {}", e),
            Self::ConnectTimeout => f.write_str("connect timed out"),
            Self::Handshake(e) => write!(f, "handshake failed: {}", e),
            Self::HandshakeTimeout => f.write_str("handshake timed out"),
        }
    }
}

/// Probes a host with one TCP connect and one TLS handshake
pub struct TlsProber {
    port: u16,
    timeout: Duration,
    connector: tokio_native_tls::TlsConnector,
    sink: SinkHandle,
    geo: Arc<dyn GeoResolver>,
    stats: ProbeStats,
}

impl TlsProber {
    /// Create a prober that accepts any certificate and sends no SNI
    pub fn new(
        port: u16,
        timeout: Duration,
        sink: SinkHandle,
        geo: Arc<dyn GeoResolver>,
        stats: ProbeStats,
    ) -> Result<Self> {
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .use_sni(false)
            .build()
            .context("Failed to build TLS connector")?;

        Ok(Self {
            port,
            timeout,
            connector: tokio_native_tls::TlsConnector::from(connector),
            sink,
            geo,
            stats,
        })
    }

    async fn connect(&self, address: &str) -> Result<TcpStream, ProbeFailure> {
        let connect = async {
            match address.parse::<IpAddr>() {
                Ok(ip) => TcpStream::connect(SocketAddr::new(ip, self.port)).await,
                Err(_) => TcpStream::connect((address, self.port)).await,
            }
        };

        timeout(self.timeout, connect)
            .await
            .map_err(|_| ProbeFailure::ConnectTimeout)?
            .map_err(ProbeFailure::Connect)
    }

    /// Connect, handshake, and read the peer's identity
    async fn handshake(&self, host: &Host) -> Result<(IpAddr, CertIdentity), ProbeFailure> {
        let stream = self.connect(&host.address).await?;
        let peer_ip = stream.peer_addr().map_err(ProbeFailure::Connect)?.ip();

        // SNI is disabled, so the domain argument only feeds hostname checks,
        // which are also disabled.
        let tls = timeout(self.timeout, self.connector.connect(&host.address, stream))
            .await
            .map_err(|_| ProbeFailure::HandshakeTimeout)?
            .map_err(ProbeFailure::Handshake)?;

        let identity = match tls.get_ref().peer_certificate() {
            Ok(Some(cert)) => match cert.to_der() {
                Ok(der) => CertificateParser::parse_identity(&der).unwrap_or_else(|e| {
                    debug!("{}: unreadable leaf certificate: {}", host, e);
                    CertIdentity::default()
                }),
                Err(e) => {
                    debug!("{}: failed to encode leaf certificate: {}", host, e);
                    CertIdentity::default()
                }
            },
            Ok(None) => CertIdentity::default(),
            Err(e) => {
                debug!("{}: failed to read peer certificate: {}", host, e);
                CertIdentity::default()
            }
        };

        Ok((peer_ip, identity))
    }
}

#[async_trait]
impl Probe for TlsProber {
    async fn probe(&self, host: &Host) -> Option<ScanResult> {
        let (peer_ip, identity) = match self.handshake(host).await {
            Ok(found) => found,
            Err(failure) => {
                debug!("{}: {}", host, failure);
                self.stats.record(failure.outcome());
                return None;
            }
        };

        self.stats.record(ProbeOutcome::Handshake);

        let result = ScanResult {
            ip: peer_ip.to_string(),
            origin: host.origin.clone(),
            domain: identity.domain,
            issuer: identity.issuer,
            geo_code: self.geo.lookup(peer_ip).unwrap_or_default(),
        };

        tracing::info!("Connected to {}", result);
        self.sink.send(result.clone()).await;

        Some(result)
    }
}
