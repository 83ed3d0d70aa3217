// src/stats.rs
//! Probe outcome counters shared by every worker of a run

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How a single probe ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// TCP connect refused, unreachable, or unresolvable
    ConnectFailed,
    /// Connect or handshake did not finish in time
    TimedOut,
    /// TCP connected but the peer did not complete a TLS handshake
    HandshakeFailed,
    /// Handshake completed; a result was produced
    Handshake,
}

const OUTCOMES: usize = 4;

/// Lock-free tally of probe outcomes; clones share the same counters
#[derive(Clone, Default)]
pub struct ProbeStats {
    counts: Arc<[AtomicU64; OUTCOMES]>,
}

impl ProbeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: ProbeOutcome) {
        self.counts[outcome as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, outcome: ProbeOutcome) -> u64 {
        self.counts[outcome as usize].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connect_failed: self.count(ProbeOutcome::ConnectFailed),
            timed_out: self.count(ProbeOutcome::TimedOut),
            handshake_failed: self.count(ProbeOutcome::HandshakeFailed),
            handshakes: self.count(ProbeOutcome::Handshake),
        }
    }
}

/// Counts read at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub connect_failed: u64,
    pub timed_out: u64,
    pub handshake_failed: u64,
    pub handshakes: u64,
}

impl StatsSnapshot {
    /// Every probe that has finished, whatever the outcome
    pub fn probed(&self) -> u64 {
        self.connect_failed + self.timed_out + self.handshake_failed + self.handshakes
    }

    /// Percentage of finished probes that reached a handshake
    pub fn hit_rate(&self) -> f64 {
        match self.probed() {
            0 => 0.0,
            probed => self.handshakes as f64 * 100.0 / probed as f64,
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} probed | {} TLS ({:.1}%) | {} refused | {} timed out | {} no TLS",
            self.probed(),
            self.handshakes,
            self.hit_rate(),
            self.connect_failed,
            self.timed_out,
            self.handshake_failed
        )
    }
}
