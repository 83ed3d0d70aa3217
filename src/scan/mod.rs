// src/scan/mod.rs
pub mod engine;
pub mod state;
pub mod worker;

pub use engine::{EngineConfig, ScanEngine, ScanReport};
pub use state::{CancelToken, RecordOutcome, ScanState};
pub use worker::{ScanWorker, WorkerExit};
