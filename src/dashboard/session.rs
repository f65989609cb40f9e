//! Dashboard Session
//!
//! Ties a [`MetricsFeed`] to a [`DashboardView`]: subscribes, activates the
//! connection, and yields a fresh frame whenever the render may have
//! changed. Deactivating unmounts the view before closing the connection so
//! nothing is applied afterwards.

use std::time::Instant;

use super::view::{DashboardView, RenderedDashboard};
use crate::config::{FeedConfig, ViewConfig};
use crate::feed::{FeedEvent, FeedResult, FeedStats, MetricsFeed, Subscription};

/// A mounted dashboard bound to one live feed
pub struct DashboardSession {
    feed: MetricsFeed,
    subscription: Option<Subscription>,
    view: DashboardView,
    finished: bool,
}

impl DashboardSession {
    /// Subscribe and open the connection
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(feed_config: FeedConfig, view_config: ViewConfig) -> FeedResult<Self> {
        let mut feed = MetricsFeed::new(feed_config);
        let subscription = feed.subscribe();
        feed.activate()?;

        Ok(Self {
            feed,
            subscription: Some(subscription),
            view: DashboardView::new(view_config),
            finished: false,
        })
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn feed(&self) -> &MetricsFeed {
        &self.feed
    }

    /// Render the current state
    pub fn render(&self) -> RenderedDashboard {
        self.view.render(Instant::now())
    }

    /// Wait for the next frame worth drawing
    ///
    /// Returns `None` once the feed reached a terminal state and that final
    /// frame was handed out, or after deactivation.
    pub async fn next_frame(&mut self) -> Option<RenderedDashboard> {
        if self.finished {
            return None;
        }

        loop {
            let subscription = self.subscription.as_mut()?;

            // Wake up once more when the snapshot turns stale
            let stale_at = if self.view.is_stale(Instant::now()) {
                None
            } else {
                self.view.stale_deadline()
            };

            let event = match stale_at {
                Some(deadline) => {
                    tokio::select! {
                        event = subscription.recv() => Some(event),
                        _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => None,
                    }
                }
                None => Some(subscription.recv().await),
            };

            let now = Instant::now();
            match event {
                None => return Some(self.view.render(now)),
                Some(None) => {
                    self.finished = true;
                    return Some(self.view.render(now));
                }
                Some(Some(event)) => {
                    let terminal = matches!(&event, FeedEvent::Status(state) if state.is_terminal());
                    let changed = self.view.handle_event(event, now);
                    if terminal {
                        self.finished = true;
                        return Some(self.view.render(now));
                    }
                    if changed {
                        return Some(self.view.render(now));
                    }
                }
            }
        }
    }

    /// Unmount the view and close the connection
    ///
    /// Safe to call more than once.
    pub async fn deactivate(&mut self) -> FeedStats {
        self.view.unmount();
        self.subscription = None;
        self.finished = true;
        self.feed.deactivate().await
    }
}
