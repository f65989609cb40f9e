//! Engagement Data Model
//!
//! Snapshot types pushed by the metrics source, plus the user and event
//! shapes owned by neighbouring services.

pub mod types;

pub use types::{EngagementMetrics, Event, User, UserRole, ZoneMetrics};
