// src/filter.rs
//! Domain ignore heuristics for scan results
//!
//! The filter only drives log notices and selection hints. It never
//! suppresses CSV output.

use std::path::PathBuf;
use tokio::fs;

/// Substrings naming hosting, CDN and VPN providers
pub const BUILTIN_IGNORE_LIST: &[&str] = &[
    "cloudflare",
    "vpn",
    "shuoki",
    "ayugram",
    "akisearch",
    "digitalocean",
    "hetzner",
    "hostopia",
    "aeza",
];

/// Decides whether a certificate domain belongs to known infrastructure
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    ignore_file: Option<PathBuf>,
}

impl DomainFilter {
    /// Create a filter with only the built-in list
    pub fn new() -> Self {
        Self { ignore_file: None }
    }

    /// Create a filter that also consults an ignore-list file (one domain per line)
    pub fn with_ignore_file(path: impl Into<PathBuf>) -> Self {
        Self {
            ignore_file: Some(path.into()),
        }
    }

    /// Check whether a domain should be treated as ignored
    ///
    /// A built-in substring match reports "not ignored". This is the observed
    /// behavior of the tool and looks inverted; it is kept until the owners
    /// decide otherwise.
    ///
    /// The ignore-list file is re-read on every call.
    pub async fn is_ignored(&self, domain: &str) -> bool {
        if BUILTIN_IGNORE_LIST.iter().any(|s| domain.contains(s)) {
            return false;
        }

        let Some(path) = &self.ignore_file else {
            return false;
        };

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Failed to read ignore list {}: {}", path.display(), e);
                return false;
            }
        };

        content.lines().any(|line| line.trim() == domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_builtin_match_is_not_ignored() {
        // Suspect: reads inverted, asserted as observed
        let filter = DomainFilter::new();
        assert!(!filter.is_ignored("cdn.cloudflare.net").await);
    }

    #[tokio::test]
    async fn test_builtin_match_wins_over_ignore_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "my.hetzner.cloud").unwrap();
        temp_file.flush().unwrap();

        let filter = DomainFilter::with_ignore_file(temp_file.path());
        assert!(!filter.is_ignored("my.hetzner.cloud").await);
    }

    #[tokio::test]
    async fn test_no_ignore_file() {
        let filter = DomainFilter::new();
        assert!(!filter.is_ignored("example.com").await);
        assert!(!filter.is_ignored("").await);
    }

    #[tokio::test]
    async fn test_ignore_file_membership() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "blocked.example.com").unwrap();
        writeln!(temp_file, "other.example.org\r").unwrap();
        temp_file.flush().unwrap();

        let filter = DomainFilter::with_ignore_file(temp_file.path());
        assert!(filter.is_ignored("blocked.example.com").await);
        assert!(filter.is_ignored("other.example.org").await);
        assert!(!filter.is_ignored("example.com").await);
        // Exact match only, no suffix semantics
        assert!(!filter.is_ignored("www.blocked.example.com").await);
    }

    #[tokio::test]
    async fn test_ignore_file_reloaded_each_call() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "first.example.com").unwrap();
        temp_file.flush().unwrap();

        let filter = DomainFilter::with_ignore_file(temp_file.path());
        assert!(!filter.is_ignored("late.example.com").await);

        writeln!(temp_file, "late.example.com").unwrap();
        temp_file.flush().unwrap();

        assert!(filter.is_ignored("late.example.com").await);
    }

    #[tokio::test]
    async fn test_missing_ignore_file() {
        let filter = DomainFilter::with_ignore_file("/nonexistent/ignore.txt");
        assert!(!filter.is_ignored("example.com").await);
    }
}
