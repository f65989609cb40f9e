//! # CrowdPulse
//!
//! Live event engagement dashboard. Connects to a metrics source over
//! WebSocket and keeps a running view of crowd density, sentiment and
//! energy for the DJ, organizer or manager watching the floor.
//!
//! ## Modules
//!
//! - [`metrics`]: Snapshot, user and event data model
//! - [`feed`]: WebSocket subscription with reconnect and fan-out
//! - [`dashboard`]: Cards, trends and the live view
//! - [`simulator`]: Synthetic metrics source for demos and tests
//! - [`config`]: TOML configuration with environment overrides
//! - [`logging`]: tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crowdpulse::config::{FeedConfig, ViewConfig};
//! use crowdpulse::dashboard::DashboardSession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = DashboardSession::activate(
//!         FeedConfig::new("ws://localhost:8080"),
//!         ViewConfig::default(),
//!     )?;
//!
//!     // Print frames until the feed gives up
//!     while let Some(frame) = session.next_frame().await {
//!         println!("{}\n", frame);
//!     }
//!
//!     session.deactivate().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dashboard;
pub mod feed;
pub mod logging;
pub mod metrics;
pub mod simulator;

pub use config::Config;
pub use dashboard::{DashboardSession, DashboardView, MetricCard, Trend};
pub use feed::{ConnectionState, FeedError, FeedEvent, MetricsFeed};
pub use metrics::{EngagementMetrics, ZoneMetrics};
