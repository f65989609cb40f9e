//! Trend derivation
//!
//! A trend compares one headline value across two consecutive snapshots.

use serde::{Deserialize, Serialize};

/// Direction a metric moved between two snapshots
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    /// Parse a trend name, returning `None` for anything unrecognized
    pub fn parse(value: &str) -> Option<Trend> {
        match value.trim().to_ascii_lowercase().as_str() {
            "increasing" => Some(Trend::Increasing),
            "decreasing" => Some(Trend::Decreasing),
            "stable" => Some(Trend::Stable),
            _ => None,
        }
    }

    /// Arrow shown next to a card value
    pub fn indicator(&self) -> &'static str {
        match self {
            Trend::Increasing => "↑",
            Trend::Decreasing => "↓",
            Trend::Stable => "→",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "increasing"),
            Trend::Decreasing => write!(f, "decreasing"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Trend between two readings by the sign of their delta
///
/// A missing reading on either side is `Stable`.
pub fn trend(previous: Option<f64>, current: Option<f64>) -> Trend {
    trend_within(previous, current, 0.0)
}

/// Like [`trend`], but deltas no larger than `tolerance` count as `Stable`
pub fn trend_within(previous: Option<f64>, current: Option<f64>, tolerance: f64) -> Trend {
    let (Some(previous), Some(current)) = (previous, current) else {
        return Trend::Stable;
    };

    let delta = current - previous;
    let tolerance = if tolerance.is_finite() { tolerance.abs() } else { 0.0 };

    if delta.is_nan() || delta.abs() <= tolerance {
        Trend::Stable
    } else if delta > 0.0 {
        Trend::Increasing
    } else {
        Trend::Decreasing
    }
}
