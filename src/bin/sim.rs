//! CrowdPulse metrics simulator
//!
//! Run with: cargo run --bin crowdpulse-sim
//!
//! # Configuration
//!
//! Flags override the config file, which is overridden by environment:
//! - `CROWDPULSE_SIM_HOST`: Host to bind to (default: 127.0.0.1)
//! - `CROWDPULSE_SIM_PORT`: Port to listen on (default: 8080)
//! - `CROWDPULSE_SIM_INTERVAL_MS`: Snapshot period, 0 disables (default: 1000)
//! - `RUST_LOG`: Log filter (default: crowdpulse=info)

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use crowdpulse::config::Config;
use crowdpulse::logging;
use crowdpulse::simulator;

/// Synthetic engagement metrics over WebSocket
#[derive(Parser, Debug)]
#[command(name = "crowdpulse-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind to
    #[arg(short = 'b', long = "host", value_name = "ADDR")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    port: Option<u16>,

    /// Milliseconds between snapshots
    #[arg(short = 'i', long = "interval-ms", value_name = "MS")]
    interval_ms: Option<u64>,

    /// Path to configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load_default(),
    };

    logging::init(&config.logging);
    tracing::info!("Starting CrowdPulse simulator v{}", env!("CARGO_PKG_VERSION"));

    let mut sim_config = config.simulator;
    if let Some(host) = cli.host {
        sim_config.host = host;
    }
    if let Some(port) = cli.port {
        sim_config.port = port;
    }
    if let Some(interval_ms) = cli.interval_ms {
        sim_config.interval_ms = interval_ms;
    }

    let addr = sim_config.addr();
    simulator::serve(sim_config)
        .await
        .with_context(|| format!("running simulator on {}", addr))?;

    Ok(())
}
