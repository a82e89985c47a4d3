//! Brisk - Headless multi-timeframe signal scanner
//!
//! Builds the symbol universe from Bybit, streams klines, and prints every
//! confirmed signal as a structured log line to stdout.
//!
//! # Usage
//! ```sh
//! brisk --config brisk.toml
//! ```
//!
//! Without `--config` the scanner is configured from `BRISK_*` environment
//! variables (a `.env` file is honored), falling back to defaults.

use anyhow::Result;
use brisk::application::scanner::ScanOrchestrator;
use brisk::config::ScanConfig;
use brisk::domain::market::Signal;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "brisk", about = "Multi-timeframe indicator signal scanner", version)]
struct Args {
    /// Path to a TOML config file; BRISK_* env vars are used when absent
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Brisk {} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::from_env()?,
    };
    info!(
        category = %config.category,
        quote = %config.quote_asset,
        max_symbols = config.max_symbols,
        timeframes = ?config.timeframes,
        confirm = ?config.confirm_timeframes,
        "Configuration loaded"
    );

    let (signal_tx, mut signal_rx) = mpsc::channel::<Signal>(100);
    let orchestrator = ScanOrchestrator::new(config, signal_tx);
    orchestrator.start().await?;

    let printer = tokio::spawn(async move {
        while let Some(signal) = signal_rx.recv().await {
            let contributing: Vec<&str> =
                signal.contributing.iter().map(String::as_str).collect();
            info!(
                "{} {} {} @ {:.6} strength {:.0}% [{}]",
                signal.symbol,
                signal.timeframe,
                signal.direction,
                signal.price,
                signal.strength * 100.0,
                contributing.join(", ")
            );
        }
    });

    info!("Scanner running. Press Ctrl+C to shutdown.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting...");

    orchestrator.stop().await;
    printer.abort();
    Ok(())
}
