//! Metrics Simulator
//!
//! A WebSocket metrics source that streams synthetic engagement snapshots
//! to every connected dashboard. Used by the `crowdpulse-sim` binary for
//! demos and by the end-to-end tests as a controllable source.
//!
//! # Endpoints
//!
//! - `GET /` and `GET /ws` - WebSocket stream of snapshots
//! - `GET /health` - Connection and publish counters
//!
//! # Example
//!
//! ```rust,no_run
//! use crowdpulse::config::SimulatorConfig;
//! use crowdpulse::simulator::Simulator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sim = Simulator::start(SimulatorConfig::default()).await?;
//!     println!("streaming on {}", sim.url());
//!     tokio::signal::ctrl_c().await?;
//!     sim.shutdown().await;
//!     Ok(())
//! }
//! ```

mod generator;
mod handler;
mod hub;

pub use generator::MetricsGenerator;
pub use handler::websocket_handler;
pub use hub::{ConnectionId, HubError, SourceHub};

use axum::{extract::State, routing::get, Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::SimulatorConfig;
use crate::metrics::EngagementMetrics;

/// Errors that can occur in the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for simulator operations
pub type SimulatorResult<T> = Result<T, SimulatorError>;

/// Shared state for the simulator routes
pub struct SimulatorState {
    pub hub: Arc<SourceHub>,
}

/// Build the simulator router
pub fn build_router(state: Arc<SimulatorState>) -> Router {
    Router::new()
        .route("/", get(websocket_handler))
        .route("/ws", get(websocket_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<SimulatorState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "connections": state.hub.connection_count().await,
        "published": state.hub.published_count(),
    }))
}

/// A running simulator
pub struct Simulator {
    addr: SocketAddr,
    hub: Arc<SourceHub>,
    shutdown: watch::Sender<bool>,
    server: JoinHandle<()>,
    generator: Option<JoinHandle<()>>,
}

impl Simulator {
    /// Bind the configured address and start serving
    ///
    /// Port 0 picks a free port; see [`Simulator::addr`].
    pub async fn start(config: SimulatorConfig) -> SimulatorResult<Self> {
        let hub = Arc::new(SourceHub::new(config.max_connections));
        let state = Arc::new(SimulatorState {
            hub: Arc::clone(&hub),
        });

        let listener = tokio::net::TcpListener::bind(config.addr()).await?;
        let addr = listener.local_addr()?;
        let (shutdown, shutdown_rx) = watch::channel(false);

        let router = build_router(state);
        let mut server_shutdown = shutdown_rx.clone();
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = server_shutdown.wait_for(|stop| *stop).await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Simulator server failed");
            }
        });

        let generator = (config.interval_ms > 0).then(|| {
            tokio::spawn(run_generator(
                Arc::clone(&hub),
                MetricsGenerator::new(config.zones.clone(), config.seed),
                Duration::from_millis(config.interval_ms),
                shutdown_rx,
            ))
        });

        tracing::info!(addr = %addr, interval_ms = config.interval_ms, "Metrics simulator listening");

        Ok(Self {
            addr,
            hub,
            shutdown,
            server,
            generator,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// WebSocket URL dashboards should connect to
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Push a snapshot to every connected dashboard
    pub async fn publish(&self, metrics: &EngagementMetrics) -> SimulatorResult<usize> {
        let payload = metrics.to_json()?;
        Ok(self.hub.broadcast(&payload).await)
    }

    /// Push an arbitrary text payload, valid or not
    pub async fn publish_raw(&self, payload: &str) -> usize {
        self.hub.broadcast(payload).await
    }

    pub async fn connection_count(&self) -> usize {
        self.hub.connection_count().await
    }

    /// Close frames received from dashboards so far
    pub fn client_close_count(&self) -> u64 {
        self.hub.client_close_count()
    }

    /// Drop every dashboard connection, leaving the listener up
    pub async fn disconnect_all(&self) -> usize {
        self.hub.disconnect_all().await
    }

    /// Wait until exactly `count` dashboards are connected
    pub async fn wait_for_connections(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.hub.connection_count().await == count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Stop the generator and the server
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        self.hub.disconnect_all().await;
        if let Some(generator) = self.generator {
            let _ = generator.await;
        }
        if let Err(e) = self.server.await {
            tracing::error!(error = %e, "Simulator server task failed");
        }
        tracing::info!("Metrics simulator stopped");
    }
}

async fn run_generator(
    hub: Arc<SourceHub>,
    mut generator: MetricsGenerator,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.wait_for(|stop| *stop) => return,
        }

        let snapshot = generator.next_snapshot(chrono::Utc::now().timestamp_millis());
        match snapshot.to_json() {
            Ok(payload) => {
                hub.broadcast(&payload).await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode synthetic snapshot"),
        }
    }
}

/// Run the simulator until Ctrl+C or SIGTERM
pub async fn serve(config: SimulatorConfig) -> SimulatorResult<()> {
    let simulator = Simulator::start(config).await?;
    shutdown_signal().await;
    simulator.shutdown().await;
    Ok(())
}

/// Wait for shutdown signal
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn test_config() -> SimulatorConfig {
        SimulatorConfig {
            port: 0,
            interval_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let state = Arc::new(SimulatorState {
            hub: Arc::new(SourceHub::new(4)),
        });
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_plain_get_on_stream_route_is_rejected() {
        let state = Arc::new(SimulatorState {
            hub: Arc::new(SourceHub::new(4)),
        });
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_start_on_ephemeral_port() {
        let sim = Simulator::start(test_config()).await.unwrap();
        assert_ne!(sim.addr().port(), 0);
        assert!(sim.url().starts_with("ws://127.0.0.1:"));
        assert_eq!(sim.connection_count().await, 0);

        // Nobody listening yet
        let sent = sim.publish(&EngagementMetrics::new(1, 1.0, 1.0, 1.0)).await.unwrap();
        assert_eq!(sent, 0);

        sim.shutdown().await;
    }
}
