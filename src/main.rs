//! CrowdPulse dashboard
//!
//! Watches a metrics source and prints the dashboard whenever it changes.
//!
//! Run with: cargo run --bin crowdpulse -- --url ws://localhost:8080

use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crowdpulse::config::{generate_default_config, Config};
use crowdpulse::dashboard::{DashboardSession, RenderedDashboard};
use crowdpulse::logging;

/// Live event engagement dashboard
#[derive(Parser, Debug)]
#[command(name = "crowdpulse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Metrics source WebSocket URL (overrides config file)
    #[arg(short = 'u', long = "url", value_name = "URL")]
    url: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Exit after the first snapshot is rendered
    #[arg(long = "once", action = ArgAction::SetTrue)]
    once: bool,

    /// Print the default configuration and exit
    #[arg(long = "print-config", action = ArgAction::SetTrue)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.url {
        config.feed.url = url;
    }

    logging::init(&config.logging);
    tracing::info!("CrowdPulse dashboard v{}", env!("CARGO_PKG_VERSION"));

    let mut session = DashboardSession::activate(config.feed.clone(), config.view.clone())
        .with_context(|| format!("connecting to {}", config.feed.url))?;

    let mut last_printed: Option<RenderedDashboard> = None;
    print_frame(&session.render(), &mut last_printed);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let next = tokio::select! {
            frame = session.next_frame() => Some(frame),
            _ = &mut ctrl_c => None,
        };

        match next {
            None => {
                tracing::info!("Shutdown signal received");
                break;
            }
            Some(None) => {
                tracing::warn!(state = %session.feed().state(), "Metrics feed stopped");
                break;
            }
            Some(Some(frame)) => {
                print_frame(&frame, &mut last_printed);
                if cli.once && frame.cards.is_some() {
                    break;
                }
            }
        }
    }

    let stats = session.deactivate().await;
    tracing::info!(
        snapshots = stats.snapshots,
        malformed = stats.malformed,
        reconnects = stats.reconnect_attempts,
        "Dashboard closed"
    );

    Ok(())
}

/// Print a frame unless it matches the last one printed
fn print_frame(frame: &RenderedDashboard, last: &mut Option<RenderedDashboard>) {
    if last.as_ref() == Some(frame) {
        return;
    }
    println!("{}\n", frame);
    *last = Some(frame.clone());
}
