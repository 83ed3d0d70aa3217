// src/progress.rs
//! Scan progress spinner using indicatif

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::stats::ProbeStats;

/// Spinner showing live scan statistics on stderr
#[derive(Clone)]
pub struct ProgressIndicator {
    spinner: Option<ProgressBar>,
}

impl ProgressIndicator {
    /// Create a new progress indicator; a disabled one does nothing
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self { spinner: None };
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed}] {msg}")
                .expect("Invalid template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            spinner: Some(spinner),
        }
    }

    /// Check if progress indicator is enabled
    pub fn is_enabled(&self) -> bool {
        self.spinner.is_some()
    }

    /// Refresh the message from `stats` every `interval` until aborted
    pub fn track(&self, stats: ProbeStats, interval: Duration) -> Option<JoinHandle<()>> {
        let spinner = self.spinner.clone()?;

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                spinner.set_message(stats.snapshot().to_string());
            }
        }))
    }

    /// Finish and clear the progress indicator
    pub fn finish(&self) {
        if let Some(ref spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_indicator_is_inert() {
        let progress = ProgressIndicator::new(false);
        assert!(!progress.is_enabled());
        assert!(progress.track(ProbeStats::new(), Duration::from_millis(10)).is_none());

        // Should not panic
        progress.finish();
    }

    #[tokio::test]
    async fn test_enabled_indicator_tracks_stats() {
        let progress = ProgressIndicator::new(true);
        assert!(progress.is_enabled());

        let handle = progress
            .track(ProbeStats::new(), Duration::from_millis(10))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
        progress.finish();
    }
}
