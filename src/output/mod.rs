// src/output/mod.rs
//! Output handling for tls-scout
//!
//! Workers never touch the destination directly. They send results through a
//! [`SinkHandle`]; a single background task owns the [`OutputHandler`] and
//! writes rows in arrival order.

use crate::types::ScanResult;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod csv;
pub mod silent;

/// Capacity of the channel between producers and the sink consumer
const SINK_CHANNEL_CAPACITY: usize = 1024;

/// Trait for output handlers that serialize scan results
#[async_trait]
pub trait OutputHandler: Send {
    /// Emit one successful scan result
    async fn emit_result(&mut self, result: &ScanResult) -> anyhow::Result<()>;

    /// Flush any buffered output
    async fn flush(&mut self) -> anyhow::Result<()>;
}

/// Single-consumer funnel in front of an output handler
pub struct OutputSink {
    tx: mpsc::Sender<ScanResult>,
    consumer: JoinHandle<u64>,
}

/// Producer side of an [`OutputSink`]
#[derive(Clone)]
pub struct SinkHandle {
    tx: mpsc::Sender<ScanResult>,
}

impl OutputSink {
    /// Start the background consumer that owns `handler`
    pub fn spawn(mut handler: Box<dyn OutputHandler>) -> Self {
        let (tx, mut rx) = mpsc::channel::<ScanResult>(SINK_CHANNEL_CAPACITY);

        let consumer = tokio::spawn(async move {
            let mut written = 0u64;

            while let Some(result) = rx.recv().await {
                match handler.emit_result(&result).await {
                    Ok(()) => written += 1,
                    Err(e) => tracing::warn!("Failed to write result for {}: {}", result.ip, e),
                }
            }

            if let Err(e) = handler.flush().await {
                tracing::warn!("Failed to flush output: {}", e);
            }

            written
        });

        Self { tx, consumer }
    }

    /// Get a producer handle
    pub fn handle(&self) -> SinkHandle {
        SinkHandle {
            tx: self.tx.clone(),
        }
    }

    /// Wait for every handle to drop, flush, and release the destination
    ///
    /// Returns the number of rows written.
    pub async fn close(self) -> u64 {
        drop(self.tx);

        match self.consumer.await {
            Ok(written) => written,
            Err(e) => {
                tracing::error!("Output sink task failed: {}", e);
                0
            }
        }
    }
}

impl SinkHandle {
    /// Queue a result for writing
    pub async fn send(&self, result: ScanResult) {
        if let Err(e) = self.tx.send(result).await {
            tracing::warn!("Output sink closed, dropping result for {}", e.0.ip);
        }
    }
}
