//! Live Dashboard
//!
//! Renders the latest engagement snapshot as three headline cards.
//!
//! ## Components
//!
//! - **MetricCard**: One titled value with an optional trend indicator
//! - **Trend**: Direction of a metric against the previous snapshot
//! - **DashboardView**: Current snapshot, trends, staleness and status
//! - **DashboardSession**: A view bound to a live feed

mod card;
mod session;
mod trend;
mod view;

pub use card::{format_percent, format_score, format_value, MetricCard, MISSING_VALUE};
pub use session::DashboardSession;
pub use trend::{trend, trend_within, Trend};
pub use view::{DashboardView, RenderedDashboard, Trends, ViewPhase, HEADER};
