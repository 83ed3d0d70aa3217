// src/cert_parser.rs
use anyhow::Result;
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::*;

/// Identity a server presents in its leaf certificate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertIdentity {
    /// Subject CN, falling back to the first DNS SAN; empty if neither exists
    pub domain: String,
    /// Issuer CN; empty if absent
    pub issuer: String,
}

/// Certificate parser for extracting the identity of a probed server
pub struct CertificateParser;

impl CertificateParser {
    /// Parse a DER-encoded leaf certificate
    pub fn parse_identity(der_bytes: &[u8]) -> Result<CertIdentity> {
        let (_, cert) = X509Certificate::from_der(der_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to parse X.509 certificate: {:?}", e))?;

        let domain = Self::extract_cn(cert.subject())
            .or_else(|| Self::first_dns_san(&cert))
            .unwrap_or_default();

        let issuer = Self::extract_cn(cert.issuer()).unwrap_or_default();

        Ok(CertIdentity { domain, issuer })
    }

    /// Extract Common Name (CN) from a distinguished name
    fn extract_cn(name: &X509Name) -> Option<String> {
        name.iter_common_name()
            .filter_map(|attr| attr.as_str().ok())
            .map(str::trim)
            .find(|cn| !cn.is_empty())
            .map(str::to_string)
    }

    /// First DNS name from the Subject Alternative Name extension (OID 2.5.29.17)
    fn first_dns_san(cert: &X509Certificate) -> Option<String> {
        for ext in cert.extensions() {
            if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
                for general_name in &san.general_names {
                    if let GeneralName::DNSName(dns_name) = general_name {
                        return Some(dns_name.to_string());
                    }
                }
            }
        }
        None
    }
}
