//! Weir Proxy Engine
//!
//! Wires the selection core into a running process: loads the configuration,
//! builds the pools, warms up every configured node, reports weights
//! periodically and exits gracefully on SIGTERM or SIGQUIT.

#![deny(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weir_core::{PoolSet, ProxyConfig};

mod reporter;
mod shutdown;

/// Weir - adaptive weighted round robin node selection
#[derive(Parser, Debug)]
#[command(name = "weir-proxy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "WEIR_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", env = "WEIR_LOG_LEVEL")]
    log_level: String,
}

/// The primary entrypoint for the Weir proxy.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => ProxyConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            warn!("no config file given, starting with no pools");
            ProxyConfig::default()
        }
    };

    let pools = Arc::new(PoolSet::from_config(&config).context("building pools")?);

    for pool in pools.snapshot() {
        let mut ramping = 0;
        for node in pool.nodes() {
            if pool.start_ramp_up(node.id)? {
                ramping += 1;
            }
        }
        info!(
            pool = pool.name(),
            nodes = pool.len(),
            ramping,
            "pool ready"
        );
    }

    let exit = shutdown::GracefulExit::new(pools.clone());
    let report = reporter::spawn_weight_reporter(
        pools.clone(),
        config.report_interval(),
        exit.token(),
    );
    let signals = shutdown::spawn_signal_listener(exit.clone())?;

    exit.wait().await;
    signals.abort();
    if let Err(e) = report.await {
        warn!("weight reporter ended abnormally: {}", e);
    }

    info!("Shutting down gracefully.");
    Ok(())
}
