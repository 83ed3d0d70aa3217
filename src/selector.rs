// src/selector.rs
//! Picks the lowest-latency server out of the scan results

use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

use crate::latency::LatencyProbe;
use crate::types::ScanResult;

/// Reported when no candidate could be measured
pub const FALLBACK_DOMAIN: &str = "yahoo.com";

/// The chosen server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Domain to report; [`FALLBACK_DOMAIN`] when nothing was measurable
    pub domain: String,
    /// Latency of the chosen result, if any
    pub latency: Option<Duration>,
    /// The chosen result, if any
    pub result: Option<ScanResult>,
}

impl Selection {
    fn fallback() -> Self {
        Self {
            domain: FALLBACK_DOMAIN.to_string(),
            latency: None,
            result: None,
        }
    }
}

/// Measure every result and keep the fastest
///
/// Ties go to the most recently measured candidate (`<=` comparison). This
/// matches the tool's observed output and is kept as-is.
pub async fn select_best(results: &[ScanResult], probe: &dyn LatencyProbe) -> Selection {
    let mut best: Option<(Duration, &ScanResult)> = None;

    for result in results {
        match probe.latency(result).await {
            Ok(latency) => {
                info!("Checked ping of {} ({}): {:?}", result.domain, result.ip, latency);
                if best.is_none_or(|(best_latency, _)| latency <= best_latency) {
                    best = Some((latency, result));
                }
            }
            Err(e) => {
                error!("Failed to check ping of {} ({}): {:#}", result.domain, result.ip, e);
            }
        }
    }

    match best {
        Some((latency, result)) => Selection {
            domain: result.domain.clone(),
            latency: Some(latency),
            result: Some(result.clone()),
        },
        None => Selection::fallback(),
    }
}

/// Persist the selected domain as raw bytes, without a trailing newline
pub async fn write_best(path: &Path, domain: &str) -> anyhow::Result<()> {
    tokio::fs::write(path, domain.as_bytes()).await?;
    Ok(())
}
