//! libre-relay - forward the latest LibreLinkUp glucose reading and its
//! short-term trend to a webhook.
//!
//! Intended to be run periodically (cron, systemd timer). Each invocation
//! logs in, fetches the graph, computes the trend, posts the reading and
//! exits.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use libre_relay_core::{relay, Config};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

async fn run_once() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let reading = relay::run(&config)
        .await
        .context("Failed to relay glucose reading")?;
    println!("{}\tValue: {}\tTrend: {}", reading.time, reading.value, reading.trend);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("libre-relay starting");

    match run_once().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
