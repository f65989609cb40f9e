//! Feed Message Types
//!
//! Decoding of inbound WebSocket frames and the events the feed publishes
//! to its subscribers.

use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message;

use super::error::FeedResult;
use crate::metrics::EngagementMetrics;

/// Connection lifecycle as seen by subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Opening the connection
    Connecting,
    /// Handshake complete, snapshots flowing
    Connected,
    /// Waiting before the next connection attempt
    Reconnecting {
        /// Consecutive failed attempts so far
        attempt: u32,
        /// Delay before the next attempt
        delay_ms: u64,
    },
    /// Connection dropped and reconnection is disabled
    Disconnected,
    /// Reconnect attempts exhausted
    GaveUp,
    /// Deactivated by the owner
    Closed,
}

impl ConnectionState {
    /// Whether the feed can still deliver snapshots in this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectionState::Disconnected | ConnectionState::GaveUp | ConnectionState::Closed
        )
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting { attempt, delay_ms } => {
                write!(f, "reconnecting (attempt {}, in {} ms)", attempt, delay_ms)
            }
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::GaveUp => write!(f, "gave up reconnecting"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Event published to every feed subscriber
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A new snapshot replaced the current one
    Snapshot(Arc<EngagementMetrics>),
    /// Connection state changed
    Status(ConnectionState),
    /// A payload was dropped because it could not be decoded
    Rejected {
        /// Decoder error message
        reason: String,
    },
}

/// What the connection loop should do with an inbound frame
#[derive(Debug)]
pub enum Inbound {
    /// Deliver this snapshot
    Snapshot(EngagementMetrics),
    /// Control frame, nothing to deliver
    Ignored,
    /// Peer closed the connection
    Close,
}

/// Decode one WebSocket frame
///
/// Text frames carry JSON; binary frames are read as UTF-8 JSON bytes.
pub fn decode_message(message: Message) -> FeedResult<Inbound> {
    match message {
        Message::Text(text) => Ok(Inbound::Snapshot(EngagementMetrics::from_json(&text)?)),
        Message::Binary(bytes) => Ok(Inbound::Snapshot(EngagementMetrics::from_slice(&bytes)?)),
        // tungstenite answers pings on the next read/write
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(Inbound::Ignored),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
