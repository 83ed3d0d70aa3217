// src/lib.rs
// Library interface for tls-scout
pub mod cert_parser;
pub mod cli;
pub mod config;
pub mod filter;
pub mod geo;
pub mod hosts;
pub mod latency;
pub mod output;
pub mod prober;
pub mod progress;
pub mod scan;
pub mod selector;
pub mod stats;
pub mod types;
