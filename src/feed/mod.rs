//! Live Metrics Feed
//!
//! Streams engagement snapshots from a metrics source over WebSocket.
//!
//! ## Architecture
//!
//! - **MetricsFeed**: Owns the connection task and its lifecycle
//! - **SnapshotHub**: Fans events out to every subscriber
//! - **Backoff**: Exponential reconnect delays with jitter
//! - **Messages**: Frame decoding and the events subscribers receive
//!
//! ```text
//!   source ──ws──▶ MetricsFeed ──▶ SnapshotHub ──▶ Subscription (view)
//!                                             └──▶ Subscription (...)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use crowdpulse::config::FeedConfig;
//! use crowdpulse::feed::{FeedEvent, MetricsFeed};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut feed = MetricsFeed::new(FeedConfig::new("ws://localhost:8080"));
//!     let mut updates = feed.subscribe();
//!     feed.activate()?;
//!
//!     while let Some(event) = updates.recv().await {
//!         if let FeedEvent::Snapshot(metrics) = event {
//!             println!("crowd density: {:?}", metrics.crowd_density);
//!             break;
//!         }
//!     }
//!
//!     feed.deactivate().await;
//!     Ok(())
//! }
//! ```

mod backoff;
mod client;
mod error;
mod hub;
mod messages;

pub use backoff::{Backoff, ReconnectPolicy};
pub use client::{FeedStats, MetricsFeed};
pub use error::{FeedError, FeedResult};
pub use hub::{SnapshotHub, Subscription, SubscriptionId};
pub use messages::{decode_message, ConnectionState, FeedEvent, Inbound};
