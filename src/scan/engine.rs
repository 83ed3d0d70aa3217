// src/scan/engine.rs
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

use super::state::{CancelToken, ScanState};
use super::worker::{ScanWorker, WorkerExit};
use crate::filter::DomainFilter;
use crate::prober::Probe;
use crate::types::{Host, ScanResult};

/// Pool-level settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of concurrent workers
    pub threads: usize,
    /// Stop when no probe has succeeded for this long
    pub idle_wait: Duration,
    /// Stop after this many successes (0 = unlimited)
    pub quota: usize,
}

/// Outcome of a finished scan run
#[derive(Debug)]
pub struct ScanReport {
    pub results: Vec<ScanResult>,
    pub exits: Vec<WorkerExit>,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    /// Successes dropped because the run was already stopping
    pub rejected: usize,
}

impl ScanReport {
    /// Number of workers that stopped for `reason`
    pub fn count_exits(&self, reason: WorkerExit) -> usize {
        self.exits.iter().filter(|&&e| e == reason).count()
    }
}

/// Fixed-size pool of scan workers
pub struct ScanEngine {
    prober: Arc<dyn Probe>,
    filter: Arc<DomainFilter>,
    config: EngineConfig,
    cancel: CancelToken,
}

impl ScanEngine {
    pub fn new(prober: Arc<dyn Probe>, filter: DomainFilter, config: EngineConfig) -> Self {
        Self {
            prober,
            filter: Arc::new(filter),
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Token that stops every worker of this engine once set
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run all workers until each has stopped
    pub async fn run(self, hosts: mpsc::Receiver<Host>) -> ScanReport {
        let hosts = Arc::new(Mutex::new(hosts));
        let state = Arc::new(ScanState::new());
        let threads = self.config.threads.max(1);

        let started = Instant::now();
        let started_at = Local::now();

        let handles: Vec<_> = (0..threads)
            .map(|id| {
                let worker = ScanWorker {
                    id,
                    prober: Arc::clone(&self.prober),
                    hosts: Arc::clone(&hosts),
                    state: Arc::clone(&state),
                    cancel: self.cancel.clone(),
                    filter: Arc::clone(&self.filter),
                    idle_wait: self.config.idle_wait,
                    quota: self.config.quota,
                };
                tokio::spawn(worker.run())
            })
            .collect();

        info!("Started {} scanning threads at {}", threads, started_at.format("%Y-%m-%d %H:%M:%S"));

        let mut exits = Vec::with_capacity(threads);
        for joined in futures_util::future::join_all(handles).await {
            match joined {
                Ok(exit) => exits.push(exit),
                Err(e) => error!("Scan worker failed: {}", e),
            }
        }

        // Closing the receiver stops the producer if it is still running
        hosts.lock().await.close();

        ScanReport {
            results: state.take_results(),
            exits,
            started_at,
            elapsed: started.elapsed(),
            rejected: state.rejected(),
        }
    }
}
