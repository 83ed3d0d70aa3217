// src/scan/worker.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::state::{CancelToken, RecordOutcome, ScanState};
use crate::filter::DomainFilter;
use crate::prober::Probe;
use crate::types::Host;

/// Host channel shared by all workers; each host goes to exactly one of them
pub type SharedHosts = Arc<Mutex<mpsc::Receiver<Host>>>;

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerExit {
    /// The host stream was exhausted
    Drained,
    /// No success within the idle window; this worker set the token
    IdleTimeout,
    /// The success quota was met; this worker set the token
    QuotaReached,
    /// Another worker (or the caller) set the token
    Cancelled,
}

/// One scanning task
pub struct ScanWorker {
    pub id: usize,
    pub prober: Arc<dyn Probe>,
    pub hosts: SharedHosts,
    pub state: Arc<ScanState>,
    pub cancel: CancelToken,
    pub filter: Arc<DomainFilter>,
    pub idle_wait: Duration,
    pub quota: usize,
}

impl ScanWorker {
    /// Main worker loop
    pub async fn run(self) -> WorkerExit {
        let exit = self.scan_loop().await;
        debug!("Worker {} stopped: {:?}", self.id, exit);
        exit
    }

    async fn scan_loop(&self) -> WorkerExit {
        loop {
            if self.state.idle_exceeds(self.idle_wait) {
                if self.cancel.cancel() {
                    info!(
                        "No successful scan in the last {}s, stopping",
                        self.idle_wait.as_secs()
                    );
                }
                return WorkerExit::IdleTimeout;
            }

            let idle_deadline = self.state.last_success() + self.idle_wait;

            let host = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return WorkerExit::Cancelled,
                host = next_host(&self.hosts) => match host {
                    Some(host) => host,
                    None => return WorkerExit::Drained,
                },
                // Re-check the idle clock even while the stream is stalled
                _ = tokio::time::sleep_until(idle_deadline.into()) => continue,
            };

            let Some(result) = self.prober.probe(&host).await else {
                continue;
            };

            if result.domain.is_empty() || self.filter.is_ignored(&result.domain).await {
                info!("Ignoring domain '{}' from {}", result.domain, result.ip);
            }

            match self.state.record(result, self.quota, &self.cancel) {
                RecordOutcome::Recorded { count } => {
                    debug!("Worker {}: {} results recorded", self.id, count);
                }
                RecordOutcome::QuotaReached => {
                    info!("Collected {} results, stopping", self.quota);
                    return WorkerExit::QuotaReached;
                }
                RecordOutcome::Rejected => {
                    debug!("Worker {}: result dropped, scan is stopping", self.id);
                }
            }
        }
    }
}

async fn next_host(hosts: &SharedHosts) -> Option<Host> {
    hosts.lock().await.recv().await
}
