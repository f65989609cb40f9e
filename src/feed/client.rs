//! Live Metrics Feed
//!
//! Owns one WebSocket connection to the metrics source, decodes every
//! inbound frame, and republishes snapshots through a [`SnapshotHub`].
//! The connection lives on its own task; `deactivate` signals it, sends a
//! close frame, and waits for the task so nothing is delivered afterwards.

use futures_util::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::backoff::{Backoff, ReconnectPolicy};
use super::error::{FeedError, FeedResult};
use super::hub::{SnapshotHub, Subscription};
use super::messages::{decode_message, ConnectionState, Inbound};
use crate::config::FeedConfig;
use crate::metrics::EngagementMetrics;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Counters describing what the feed has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Successful connection handshakes
    pub connects: u64,
    /// Data frames received (decoded or not)
    pub messages: u64,
    /// Snapshots delivered to the hub
    pub snapshots: u64,
    /// Payloads dropped because they failed to decode
    pub malformed: u64,
    /// Reconnect attempts scheduled
    pub reconnect_attempts: u64,
    /// Close frames sent on deactivation
    pub closes: u64,
}

#[derive(Default)]
struct FeedCounters {
    connects: AtomicU64,
    messages: AtomicU64,
    snapshots: AtomicU64,
    malformed: AtomicU64,
    reconnect_attempts: AtomicU64,
    closes: AtomicU64,
}

impl FeedCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn stats(&self) -> FeedStats {
        FeedStats {
            connects: self.connects.load(Ordering::Relaxed),
            messages: self.messages.load(Ordering::Relaxed),
            snapshots: self.snapshots.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            closes: self.closes.load(Ordering::Relaxed),
        }
    }
}

enum Lifecycle {
    Idle,
    Active {
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
    },
    Closed,
}

/// Live connection to a metrics source
pub struct MetricsFeed {
    config: FeedConfig,
    hub: Arc<SnapshotHub>,
    counters: Arc<FeedCounters>,
    lifecycle: Lifecycle,
}

impl MetricsFeed {
    /// Create an inactive feed for the configured endpoint
    pub fn new(config: FeedConfig) -> Self {
        let hub = Arc::new(SnapshotHub::new(config.channel_capacity));
        Self {
            config,
            hub,
            counters: Arc::new(FeedCounters::default()),
            lifecycle: Lifecycle::Idle,
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Register a subscriber; any number may listen at once
    pub fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    /// Most recently delivered snapshot
    pub fn latest(&self) -> Option<Arc<EngagementMetrics>> {
        self.hub.latest()
    }

    pub fn state(&self) -> ConnectionState {
        self.hub.state()
    }

    pub fn stats(&self) -> FeedStats {
        self.counters.stats()
    }

    /// Whether the connection task is still running
    pub fn is_active(&self) -> bool {
        match &self.lifecycle {
            Lifecycle::Active { task, .. } => !task.is_finished(),
            Lifecycle::Idle | Lifecycle::Closed => false,
        }
    }

    /// Open the connection on a background task
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self) -> FeedResult<()> {
        match self.lifecycle {
            Lifecycle::Active { .. } => return Err(FeedError::AlreadyActive),
            Lifecycle::Closed => return Err(FeedError::Closed),
            Lifecycle::Idle => {}
        }
        validate_url(&self.config.url)?;
        if self.config.url.starts_with("wss://") {
            install_tls_provider();
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let connection = Connection {
            url: self.config.url.clone(),
            policy: ReconnectPolicy::from_config(&self.config.reconnect),
            reconnect: self.config.reconnect.enabled,
            hub: Arc::clone(&self.hub),
            counters: Arc::clone(&self.counters),
            shutdown: shutdown_rx,
        };

        tracing::info!(url = %self.config.url, "Activating metrics feed");
        let task = tokio::spawn(connection.run());

        self.lifecycle = Lifecycle::Active {
            shutdown: shutdown_tx,
            task,
        };
        Ok(())
    }

    /// Close the connection and stop delivering
    ///
    /// Safe to call more than once; only the first call closes anything.
    pub async fn deactivate(&mut self) -> FeedStats {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Closed) {
            Lifecycle::Active { shutdown, task } => {
                let _ = shutdown.send(true);
                if let Err(e) = task.await {
                    tracing::error!(error = %e, "Metrics feed task failed");
                }
                tracing::info!(url = %self.config.url, "Metrics feed deactivated");
            }
            Lifecycle::Idle | Lifecycle::Closed => {}
        }
        self.stats()
    }
}

/// Accepts `ws://` and `wss://` endpoints of the form `scheme://host[:port][/path]`
fn validate_url(url: &str) -> FeedResult<()> {
    let rest = url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("wss://"))
        .ok_or_else(|| FeedError::InvalidUrl(url.to_string()))?;

    let host = rest.split(['/', '?']).next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') {
        return Err(FeedError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

/// Select ring as the process-wide rustls provider unless one is already set
fn install_tls_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

/// Resolves once shutdown is requested or the feed handle is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// How a single connection ended
enum Ended {
    Shutdown,
    Dropped(String),
}

/// State owned by the connection task
struct Connection {
    url: String,
    policy: ReconnectPolicy,
    reconnect: bool,
    hub: Arc<SnapshotHub>,
    counters: Arc<FeedCounters>,
    shutdown: watch::Receiver<bool>,
}

impl Connection {
    async fn run(mut self) {
        let mut backoff = Backoff::new(self.policy.clone());

        let final_state = loop {
            self.hub.publish_status(ConnectionState::Connecting);

            let connected = tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown) => None,
                result = connect_async(self.url.as_str()) => Some(result),
            };
            let Some(result) = connected else {
                break ConnectionState::Closed;
            };

            match result {
                Ok((stream, _response)) => {
                    FeedCounters::bump(&self.counters.connects);
                    backoff.reset();
                    tracing::info!(url = %self.url, "Connected to metrics source");
                    self.hub.publish_status(ConnectionState::Connected);

                    match self.pump(stream).await {
                        Ended::Shutdown => break ConnectionState::Closed,
                        Ended::Dropped(reason) => {
                            tracing::warn!(url = %self.url, reason = %reason, "Metrics connection dropped");
                        }
                    }
                }
                Err(e) => {
                    let error = FeedError::Connect(e.to_string());
                    tracing::warn!(url = %self.url, error = %error, "Failed to connect to metrics source");
                }
            }

            if !self.reconnect {
                break ConnectionState::Disconnected;
            }

            let Some(delay) = backoff.next_delay() else {
                tracing::error!(
                    url = %self.url,
                    attempts = backoff.attempt(),
                    "Giving up on metrics source"
                );
                break ConnectionState::GaveUp;
            };

            FeedCounters::bump(&self.counters.reconnect_attempts);
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            tracing::info!(attempt = backoff.attempt(), delay_ms, "Scheduling reconnect");
            self.hub.publish_status(ConnectionState::Reconnecting {
                attempt: backoff.attempt(),
                delay_ms,
            });

            let resumed = tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown) => false,
                _ = tokio::time::sleep(delay) => true,
            };
            if !resumed {
                break ConnectionState::Closed;
            }
        };

        self.hub.publish_status(final_state);
    }

    /// Read frames until the connection drops or shutdown is requested
    async fn pump(&mut self, mut stream: WsStream) -> Ended {
        loop {
            let next = tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown) => None,
                next = stream.next() => Some(next),
            };

            let Some(next) = next else {
                if let Err(e) = stream.close(None).await {
                    tracing::debug!(error = %e, "Close handshake failed");
                }
                FeedCounters::bump(&self.counters.closes);
                tracing::debug!(url = %self.url, "Closed metrics connection");
                return Ended::Shutdown;
            };

            let message = match next {
                None => return Ended::Dropped("stream ended".to_string()),
                Some(Err(e)) => return Ended::Dropped(FeedError::from(e).to_string()),
                Some(Ok(message)) => message,
            };

            match decode_message(message) {
                Ok(Inbound::Snapshot(metrics)) => {
                    FeedCounters::bump(&self.counters.messages);
                    FeedCounters::bump(&self.counters.snapshots);
                    self.hub.publish_snapshot(metrics);
                }
                Ok(Inbound::Ignored) => {}
                Ok(Inbound::Close) => return Ended::Dropped("closed by source".to_string()),
                Err(e) => {
                    FeedCounters::bump(&self.counters.messages);
                    FeedCounters::bump(&self.counters.malformed);
                    tracing::warn!(error = %e, "Dropping malformed metrics payload");
                    self.hub.publish_rejected(e.to_string());
                }
            }
        }
    }
}
