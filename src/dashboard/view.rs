//! Dashboard View
//!
//! Holds the current snapshot and turns it into a fixed set of metric cards.
//!
//! ```text
//!   Waiting ──snapshot──▶ Live ──snapshot──▶ Live
//!      │                   │
//!      └──── unmount ──────┴──▶ Unmounted (terminal)
//! ```

use std::sync::Arc;
use std::time::Instant;

use super::card::{format_percent, format_score, MetricCard};
use super::trend::{trend_within, Trend};
use crate::config::ViewConfig;
use crate::feed::{ConnectionState, FeedEvent};
use crate::metrics::EngagementMetrics;

/// Page header, always rendered
pub const HEADER: &str = "Live Event Dashboard";

/// Lifecycle of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    /// No snapshot yet
    Waiting,
    /// Showing a snapshot
    Live,
    /// Deactivated; ignores further updates
    Unmounted,
}

/// Trend of each headline metric against the previous snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trends {
    pub crowd_density: Trend,
    pub sentiment: Trend,
    pub energy_level: Trend,
}

impl Default for Trends {
    fn default() -> Self {
        Self {
            crowd_density: Trend::Stable,
            sentiment: Trend::Stable,
            energy_level: Trend::Stable,
        }
    }
}

/// Dashboard state: at most one current snapshot
pub struct DashboardView {
    config: ViewConfig,
    phase: ViewPhase,
    current: Option<Arc<EngagementMetrics>>,
    trends: Trends,
    last_update: Option<Instant>,
    connection: ConnectionState,
    rejected: u64,
}

impl DashboardView {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            phase: ViewPhase::Waiting,
            current: None,
            trends: Trends::default(),
            last_update: None,
            connection: ConnectionState::Connecting,
            rejected: 0,
        }
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    /// The snapshot currently shown
    pub fn current(&self) -> Option<&EngagementMetrics> {
        self.current.as_deref()
    }

    pub fn trends(&self) -> Trends {
        self.trends
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Payloads the feed dropped while this view was live
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Replace the current snapshot
    ///
    /// Returns false once the view is unmounted.
    pub fn apply(&mut self, snapshot: Arc<EngagementMetrics>, now: Instant) -> bool {
        if self.phase == ViewPhase::Unmounted {
            return false;
        }

        let tolerance = self.config.trend_tolerance;
        self.trends = match self.current.as_deref() {
            Some(previous) => Trends {
                crowd_density: trend_within(previous.crowd_density, snapshot.crowd_density, tolerance),
                sentiment: trend_within(previous.sentiment, snapshot.sentiment, tolerance),
                energy_level: trend_within(previous.energy_level, snapshot.energy_level, tolerance),
            },
            None => Trends::default(),
        };

        self.current = Some(snapshot);
        self.last_update = Some(now);
        self.phase = ViewPhase::Live;
        true
    }

    /// Apply a feed event; returns true if the render may have changed
    pub fn handle_event(&mut self, event: FeedEvent, now: Instant) -> bool {
        if self.phase == ViewPhase::Unmounted {
            return false;
        }

        match event {
            FeedEvent::Snapshot(snapshot) => self.apply(snapshot, now),
            FeedEvent::Status(state) => {
                let changed = self.connection != state;
                self.connection = state;
                changed
            }
            FeedEvent::Rejected { .. } => {
                self.rejected += 1;
                true
            }
        }
    }

    /// Whether the current snapshot is older than the staleness threshold
    pub fn is_stale(&self, now: Instant) -> bool {
        self.stale_deadline()
            .map(|deadline| now >= deadline)
            .unwrap_or(false)
    }

    /// When the current snapshot turns stale
    pub fn stale_deadline(&self) -> Option<Instant> {
        if self.phase != ViewPhase::Live {
            return None;
        }
        self.last_update
            .map(|updated| updated + self.config.stale_after())
    }

    /// The three headline cards, once a snapshot exists
    pub fn cards(&self) -> Option<Vec<MetricCard>> {
        let metrics = self.current.as_deref()?;

        Some(vec![
            MetricCard::new(
                "Crowd Density",
                format_percent(metrics.crowd_density),
                self.trends.crowd_density,
            ),
            MetricCard::new(
                "Sentiment",
                format_score(metrics.sentiment),
                self.trends.sentiment,
            ),
            MetricCard::new(
                "Energy Level",
                format_percent(metrics.energy_level),
                self.trends.energy_level,
            ),
        ])
    }

    /// Render the page
    pub fn render(&self, now: Instant) -> RenderedDashboard {
        RenderedDashboard {
            header: HEADER.to_string(),
            cards: self.cards(),
            status: self.status_line(now),
        }
    }

    /// Drop the snapshot and ignore everything from here on
    pub fn unmount(&mut self) {
        self.phase = ViewPhase::Unmounted;
        self.current = None;
        self.last_update = None;
    }

    fn status_line(&self, now: Instant) -> Option<String> {
        let metrics = self.current.as_deref()?;
        let mut notes = Vec::new();

        if self.is_stale(now) {
            let last = metrics
                .timestamp
                .and_then(chrono::DateTime::from_timestamp_millis)
                .map(|dt| dt.format("%H:%M:%S UTC").to_string());
            match last {
                Some(time) => notes.push(format!("stale data (last update {})", time)),
                None => notes.push("stale data".to_string()),
            }
        }

        match self.connection {
            ConnectionState::Connecting | ConnectionState::Connected => {}
            other => notes.push(format!("feed {}", other)),
        }

        if self.rejected > 0 {
            notes.push(format!("{} payload(s) rejected", self.rejected));
        }

        if notes.is_empty() {
            None
        } else {
            Some(notes.join(" | "))
        }
    }
}

/// One rendered frame of the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDashboard {
    pub header: String,
    /// Absent until the first snapshot arrives
    pub cards: Option<Vec<MetricCard>>,
    /// Stale / degraded notes, if any
    pub status: Option<String>,
}

impl RenderedDashboard {
    pub fn card(&self, title: &str) -> Option<&MetricCard> {
        self.cards.as_ref()?.iter().find(|c| c.title == title)
    }

    /// Card values in display order
    pub fn values(&self) -> Vec<&str> {
        self.cards
            .iter()
            .flatten()
            .map(|c| c.value.as_str())
            .collect()
    }
}

impl std::fmt::Display for RenderedDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.header)?;
        for card in self.cards.iter().flatten() {
            write!(f, "\n\n{}", card)?;
        }
        if let Some(status) = &self.status {
            write!(f, "\n\n! {}", status)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn view() -> DashboardView {
        DashboardView::new(ViewConfig::default())
    }

    fn snapshot(crowd: f64, sentiment: f64, energy: f64) -> Arc<EngagementMetrics> {
        Arc::new(EngagementMetrics::new(1000, crowd, sentiment, energy))
    }

    #[test]
    fn test_header_only_before_first_snapshot() {
        let view = view();
        let frame = view.render(Instant::now());

        assert_eq!(view.phase(), ViewPhase::Waiting);
        assert_eq!(frame.header, "Live Event Dashboard");
        assert!(frame.cards.is_none());
        assert!(frame.status.is_none());
        assert_eq!(frame.to_string(), "Live Event Dashboard");
    }

    #[test]
    fn test_snapshot_renders_three_cards() {
        let mut view = view();
        let now = Instant::now();
        assert!(view.apply(snapshot(72.0, 8.0, 65.0), now));

        let frame = view.render(now);
        assert_eq!(view.phase(), ViewPhase::Live);
        assert_eq!(frame.values(), vec!["72%", "8/10", "65%"]);
        assert_eq!(frame.card("Sentiment").unwrap().value, "8/10");
        assert_eq!(view.trends(), Trends::default());
    }

    #[test]
    fn test_second_snapshot_fully_replaces_first() {
        let mut view = view();
        let now = Instant::now();
        view.apply(snapshot(40.0, 7.0, 60.0), now);
        view.apply(snapshot(55.0, 5.0, 30.0), now);

        let frame = view.render(now);
        assert_eq!(frame.values(), vec!["55%", "5/10", "30%"]);

        let text = frame.to_string();
        assert!(!text.contains("40%"));
        assert!(!text.contains("7/10"));
        assert!(!text.contains("60%"));
    }

    #[test]
    fn test_trends_follow_consecutive_snapshots() {
        let mut view = view();
        let now = Instant::now();
        view.apply(snapshot(40.0, 7.0, 60.0), now);
        view.apply(snapshot(55.0, 5.0, 60.0), now);

        let trends = view.trends();
        assert_eq!(trends.crowd_density, Trend::Increasing);
        assert_eq!(trends.sentiment, Trend::Decreasing);
        assert_eq!(trends.energy_level, Trend::Stable);

        let frame = view.render(now);
        assert_eq!(frame.card("Crowd Density").unwrap().render(), "Crowd Density\n  55% ↑");
    }

    #[test]
    fn test_missing_field_passes_through() {
        let mut view = view();
        let metrics =
            EngagementMetrics::from_json(r#"{"timestamp":1000,"crowdDensity":40,"sentiment":7}"#)
                .unwrap();
        view.apply(Arc::new(metrics), Instant::now());

        let frame = view.render(Instant::now());
        assert_eq!(frame.values(), vec!["40%", "7/10", "—%"]);
    }

    #[test]
    fn test_unmount_ignores_later_updates() {
        let mut view = view();
        let now = Instant::now();
        view.apply(snapshot(72.0, 8.0, 65.0), now);
        view.unmount();

        assert!(!view.apply(snapshot(10.0, 1.0, 10.0), now));
        assert!(!view.handle_event(FeedEvent::Snapshot(snapshot(20.0, 2.0, 20.0)), now));
        assert_eq!(view.phase(), ViewPhase::Unmounted);
        assert!(view.current().is_none());
        assert!(view.render(now).cards.is_none());
    }

    #[test]
    fn test_stale_indicator() {
        let config = ViewConfig {
            stale_after_ms: 5000,
            trend_tolerance: 0.0,
        };
        let mut view = DashboardView::new(config);
        let start = Instant::now();
        assert!(view.stale_deadline().is_none());

        view.apply(snapshot(72.0, 8.0, 65.0), start);
        assert!(!view.is_stale(start + Duration::from_millis(4999)));
        assert!(view.render(start).status.is_none());

        let later = start + Duration::from_secs(6);
        assert!(view.is_stale(later));
        let status = view.render(later).status.unwrap();
        assert_eq!(status, "stale data (last update 00:00:01 UTC)");

        // A fresh snapshot clears it
        view.apply(snapshot(70.0, 8.0, 65.0), later);
        assert!(view.render(later).status.is_none());
    }

    #[test]
    fn test_status_reports_feed_problems() {
        let mut view = view();
        let now = Instant::now();
        view.apply(snapshot(72.0, 8.0, 65.0), now);

        assert!(view.handle_event(
            FeedEvent::Status(ConnectionState::Reconnecting {
                attempt: 1,
                delay_ms: 1000
            }),
            now
        ));
        assert!(view.handle_event(
            FeedEvent::Rejected {
                reason: "expected value".to_string()
            },
            now
        ));

        let frame = view.render(now);
        assert_eq!(
            frame.status.as_deref(),
            Some("feed reconnecting (attempt 1, in 1000 ms) | 1 payload(s) rejected")
        );
        // Rejections never touch the snapshot
        assert_eq!(frame.values(), vec!["72%", "8/10", "65%"]);
        assert!(frame.to_string().ends_with("\n\n! feed reconnecting (attempt 1, in 1000 ms) | 1 payload(s) rejected"));
    }

    #[test]
    fn test_trend_tolerance_from_config() {
        let config = ViewConfig {
            stale_after_ms: 10_000,
            trend_tolerance: 1.0,
        };
        let mut view = DashboardView::new(config);
        let now = Instant::now();
        view.apply(snapshot(50.0, 5.0, 50.0), now);
        view.apply(snapshot(50.5, 7.0, 48.0), now);

        let trends = view.trends();
        assert_eq!(trends.crowd_density, Trend::Stable);
        assert_eq!(trends.sentiment, Trend::Increasing);
        assert_eq!(trends.energy_level, Trend::Decreasing);
    }
}
