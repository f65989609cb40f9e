//! Source Connection Hub
//!
//! Tracks every dashboard connected to the simulator and pushes payloads to
//! all of them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all connected dashboards
pub struct SourceHub {
    /// Active connections: ConnectionId → outbound text channel
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>>,
    /// Maximum number of concurrent connections
    max_connections: usize,
    /// Payloads pushed through `broadcast`
    published: AtomicU64,
    /// Close frames received from clients
    client_closes: AtomicU64,
}

impl SourceHub {
    /// Create a new hub
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            max_connections,
            published: AtomicU64::new(0),
            client_closes: AtomicU64::new(0),
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<String>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.max_connections {
            return Err(HubError::TooManyConnections(self.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(id.clone(), sender);

        tracing::info!(connection_id = %id, "Dashboard connected");
        Ok(id)
    }

    /// Unregister a connection
    pub async fn unregister(&self, id: &str) {
        self.connections.write().await.remove(id);
        tracing::info!(connection_id = %id, "Dashboard disconnected");
    }

    /// Push a text payload to every connection
    ///
    /// Returns how many connections accepted it.
    pub async fn broadcast(&self, payload: &str) -> usize {
        let connections = self.connections.read().await;
        self.published.fetch_add(1, Ordering::Relaxed);

        let mut sent_count = 0;
        for handle in connections.values() {
            if handle.send(payload.to_string()).is_ok() {
                sent_count += 1;
            }
        }

        tracing::trace!(subscribers = sent_count, "Broadcast payload");
        sent_count
    }

    /// Drop every connection; their sockets close once the outbound channel ends
    pub async fn disconnect_all(&self) -> usize {
        let mut connections = self.connections.write().await;
        let count = connections.len();
        connections.clear();
        tracing::info!(count, "Dropped all dashboard connections");
        count
    }

    /// Record a close frame sent by a client
    pub fn record_client_close(&self) {
        self.client_closes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Payloads broadcast so far
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Close frames received from clients so far
    pub fn client_close_count(&self) -> u64 {
        self.client_closes.load(Ordering::Relaxed)
    }
}

/// Errors that can occur in the source hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),
}
