// src/output/silent.rs
//! Discarding output handler, used when no output file is configured

use crate::output::OutputHandler;
use crate::types::ScanResult;
use async_trait::async_trait;

/// Output handler that drops every result
pub struct SilentOutput;

#[async_trait]
impl OutputHandler for SilentOutput {
    async fn emit_result(&mut self, _result: &ScanResult) -> anyhow::Result<()> {
        Ok(())
    }

    async fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
