// src/main.rs
use clap::Parser;
use is_terminal::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tls_scout::cli::Cli;
use tls_scout::config::Config;
use tls_scout::filter::DomainFilter;
use tls_scout::geo::{GeoResolver, GeoTable, NoGeo};
use tls_scout::hosts;
use tls_scout::latency::TcpPing;
use tls_scout::output::{csv::CsvOutput, silent::SilentOutput, OutputHandler, OutputSink};
use tls_scout::prober::TlsProber;
use tls_scout::progress::ProgressIndicator;
use tls_scout::scan::{EngineConfig, ScanEngine, WorkerExit};
use tls_scout::selector;
use tls_scout::stats::ProbeStats;
use tracing_subscriber::EnvFilter;

/// Cleared at startup so every connection is direct
const PROXY_VARS: &[&str] = &[
    "ALL_PROXY",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "NO_PROXY",
    "all_proxy",
    "http_proxy",
    "https_proxy",
    "no_proxy",
];

fn main() -> anyhow::Result<()> {
    for var in PROXY_VARS {
        // SAFETY: still single-threaded; the runtime is built below
        unsafe { std::env::remove_var(var) };
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli));
    Ok(())
}

async fn run(cli: Cli) {
    // Load config file
    let config = match &cli.config {
        Some(path) => Config::from_file(Path::new(path)),
        None => Ok(Config::default()),
    };

    // Initialize logging
    let log_level = match &config {
        Ok(config) => cli.log_level(config).to_string(),
        Err(_) if cli.verbose => "debug".to_string(),
        Err(_) => "info".to_string(),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match config {
        Ok(mut config) => {
            cli.apply_to(&mut config);
            scan(&cli, config).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
    }
}

async fn scan(cli: &Cli, config: Config) -> anyhow::Result<()> {
    // Validate arguments
    cli.validate()?;
    config.validate()?;
    let target = cli.target()?;

    // Create output handler
    let handler: Box<dyn OutputHandler> = if config.output.out.is_empty() {
        tracing::info!("No output file, discarding results");
        Box::new(SilentOutput)
    } else {
        let handler = CsvOutput::to_file(Path::new(&config.output.out))?;
        tracing::info!("Writing CSV output to: {}", config.output.out);
        Box::new(handler)
    };

    let host_rx = hosts::enumerate(&target, config.scan.enable_ipv6).await?;

    let geo: Arc<dyn GeoResolver> = match config.filter.geo_table {
        Some(ref path) => {
            let table = GeoTable::from_file(Path::new(path))?;
            tracing::info!("Loaded geo table: {} ranges", table.len());
            Arc::new(table)
        }
        None => Arc::new(NoGeo),
    };

    let filter = match config.filter.ignore_domains {
        Some(ref path) => DomainFilter::with_ignore_file(path),
        None => DomainFilter::new(),
    };

    let stats = ProbeStats::new();
    let progress = ProgressIndicator::new(cli.should_show_progress(std::io::stderr().is_terminal()));
    let tracker = progress.track(stats.clone(), Duration::from_millis(500));

    let sink = OutputSink::spawn(handler);
    let prober = TlsProber::new(
        config.scan.port,
        config.scan.timeout(),
        sink.handle(),
        geo,
        stats.clone(),
    )?;

    let engine = ScanEngine::new(
        Arc::new(prober),
        filter,
        EngineConfig {
            threads: config.scan.threads,
            idle_wait: config.scan.idle_wait(),
            quota: config.scan.best,
        },
    );

    // Ctrl-C stops the workers the same way the idle timeout does
    let cancel = engine.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping scan...");
            cancel.cancel();
        }
    });

    let report = engine.run(host_rx).await;

    interrupt.abort();
    if let Some(tracker) = tracker {
        tracker.abort();
    }
    progress.finish();

    let rows = sink.close().await;

    tracing::info!(
        "Workers stopped: {} drained, {} idle, {} quota, {} cancelled",
        report.count_exits(WorkerExit::Drained),
        report.count_exits(WorkerExit::IdleTimeout),
        report.count_exits(WorkerExit::QuotaReached),
        report.count_exits(WorkerExit::Cancelled),
    );

    if config.scan.best > 0 {
        let ping = TcpPing::new(config.scan.port, config.scan.timeout());
        let best = selector::select_best(&report.results, &ping).await;

        tracing::info!(
            "Best server found: {} (ping: {})",
            best.domain,
            best.latency
                .map(|l| format!("{}ms", l.as_millis()))
                .unwrap_or_else(|| "n/a".to_string())
        );

        if let Some(ref path) = config.output.best_out {
            if let Err(e) = selector::write_best(Path::new(path), &best.domain).await {
                tracing::error!("Failed to save best server to {}: {}", path, e);
            }
        }
    }

    tracing::info!("Scanning completed in {:.1?}: {}", report.elapsed, stats.snapshot());
    tracing::info!(
        "{} results recorded, {} dropped after stop, {} rows written",
        report.results.len(),
        report.rejected,
        rows
    );

    Ok(())
}
