// src/types.rs
use std::fmt;

/// A single scan target produced by the host enumerator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host {
    /// IP literal or hostname to connect to
    pub address: String,

    /// The input that selected this host (CIDR, file line, or the address itself)
    pub origin: String,
}

impl Host {
    pub fn new(address: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            origin: origin.into(),
        }
    }

    /// Host whose origin is its own address
    pub fn bare(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            origin: address.clone(),
            address,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address == self.origin {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.address, self.origin)
        }
    }
}

/// Identity observed from one successful TLS handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Peer IP address the handshake completed against
    pub ip: String,

    /// Origin of the host that produced this result
    pub origin: String,

    /// Leaf certificate domain (subject CN, else first DNS SAN); may be empty
    pub domain: String,

    /// Common name of the certificate issuer; may be empty
    pub issuer: String,

    /// Two-letter country code of the peer, empty when unknown
    pub geo_code: String,
}

impl ScanResult {
    /// Fields in CSV column order
    pub fn to_record(&self) -> [&str; 5] {
        [
            &self.ip,
            &self.origin,
            &self.domain,
            &self.issuer,
            &self.geo_code,
        ]
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] domain={} issuer={} geo={}",
            self.ip, self.origin, self.domain, self.issuer, self.geo_code
        )
    }
}
