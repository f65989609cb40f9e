//! Snapshot Hub
//!
//! Fans feed events out to any number of subscribers.
//! Uses a tokio broadcast channel for events and watch channels for the
//! latest snapshot and connection state, so late or lagging subscribers can
//! always catch up to the current picture.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use super::messages::{ConnectionState, FeedEvent};
use crate::metrics::EngagementMetrics;

/// Unique identifier for a feed subscription
pub type SubscriptionId = u64;

/// Publishes feed events to every registered subscriber
pub struct SnapshotHub {
    /// Event fan-out
    events: broadcast::Sender<FeedEvent>,
    /// Most recently published snapshot
    latest: watch::Sender<Option<Arc<EngagementMetrics>>>,
    /// Current connection state
    state: watch::Sender<ConnectionState>,
    next_id: AtomicU64,
}

impl SnapshotHub {
    /// Create a hub buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        let (latest, _) = watch::channel(None);
        let (state, _) = watch::channel(ConnectionState::Connecting);

        Self {
            events,
            latest,
            state,
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new subscriber
    ///
    /// The subscriber receives every event published after this call.
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let receiver = self.events.subscribe();

        tracing::debug!(subscription_id = id, "Feed subscriber registered");

        Subscription {
            id,
            receiver,
            hub: Arc::clone(self),
            pending: VecDeque::new(),
        }
    }

    /// Replace the current snapshot and notify subscribers
    pub fn publish_snapshot(&self, metrics: EngagementMetrics) -> Arc<EngagementMetrics> {
        let snapshot = Arc::new(metrics);
        self.latest.send_replace(Some(Arc::clone(&snapshot)));
        let delivered = self.events.send(FeedEvent::Snapshot(Arc::clone(&snapshot))).unwrap_or(0);

        tracing::trace!(subscribers = delivered, "Published snapshot");
        snapshot
    }

    /// Record a connection state change and notify subscribers
    pub fn publish_status(&self, state: ConnectionState) {
        self.state.send_replace(state);
        let _ = self.events.send(FeedEvent::Status(state));
    }

    /// Notify subscribers that a payload was dropped
    pub fn publish_rejected(&self, reason: impl Into<String>) {
        let _ = self.events.send(FeedEvent::Rejected {
            reason: reason.into(),
        });
    }

    /// Most recently published snapshot
    pub fn latest(&self) -> Option<Arc<EngagementMetrics>> {
        self.latest.borrow().clone()
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

/// A registered listener on a [`SnapshotHub`]
pub struct Subscription {
    id: SubscriptionId,
    receiver: broadcast::Receiver<FeedEvent>,
    hub: Arc<SnapshotHub>,
    /// Events recovered after a lag, handed out before the channel
    pending: VecDeque<FeedEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event
    ///
    /// A subscriber that fell behind skips ahead to the newest snapshot but
    /// still sees every status change and rejection that was not
    /// overwritten, followed by the current connection state.
    /// Returns `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => self.catch_up(skipped),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is already buffered
    pub fn try_recv(&mut self) -> Option<FeedEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => self.catch_up(skipped),
                Err(_) => return None,
            }
        }
    }

    /// Most recently published snapshot on the underlying hub
    pub fn latest(&self) -> Option<Arc<EngagementMetrics>> {
        self.hub.latest()
    }

    /// Rebuild the pending queue after the channel overwrote `skipped` events
    ///
    /// The receiver already points at the oldest event still held, so the
    /// rest of the buffer is drained from there. Only the newest snapshot is
    /// kept; statuses and rejections keep their order. The current state is
    /// appended whenever the drained events do not end on it, since status
    /// changes may have been among the overwritten ones.
    fn catch_up(&mut self, skipped: u64) {
        tracing::debug!(
            subscription_id = self.id,
            skipped,
            "Feed subscriber lagged, skipping ahead"
        );

        let mut drained = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => drained.push(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }

        let newest_snapshot = drained
            .iter()
            .rposition(|event| matches!(event, FeedEvent::Snapshot(_)));
        if newest_snapshot.is_none() {
            if let Some(latest) = self.hub.latest() {
                self.pending.push_back(FeedEvent::Snapshot(latest));
            }
        }

        let mut last_status = None;
        for (index, event) in drained.into_iter().enumerate() {
            match event {
                FeedEvent::Snapshot(_) if Some(index) != newest_snapshot => {}
                FeedEvent::Status(state) => {
                    last_status = Some(state);
                    self.pending.push_back(event);
                }
                other => self.pending.push_back(other),
            }
        }

        let current = self.hub.state();
        if last_status != Some(current) {
            self.pending.push_back(FeedEvent::Status(current));
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!(subscription_id = self.id, "Feed subscriber removed");
    }
}
