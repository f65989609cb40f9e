//! Metric Card
//!
//! Displays a single metric with its formatted value and trend.

use super::trend::Trend;

/// Placeholder shown for a value the source did not send
pub const MISSING_VALUE: &str = "—";

/// Format a reading the way the source sent it (`72` stays `72`, `7.5` stays `7.5`)
pub fn format_value(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_VALUE.to_string())
}

/// `"<value>%"`
pub fn format_percent(value: Option<f64>) -> String {
    format!("{}%", format_value(value))
}

/// `"<value>/10"`
pub fn format_score(value: Option<f64>) -> String {
    format!("{}/10", format_value(value))
}

/// A static card: title, formatted value, optional trend indicator
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub title: String,
    pub value: String,
    /// `None` renders no indicator
    pub trend: Option<Trend>,
}

impl MetricCard {
    pub fn new(title: impl Into<String>, value: impl Into<String>, trend: Trend) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            trend: Some(trend),
        }
    }

    /// Build a card from a trend name; unknown names are accepted and show no indicator
    pub fn with_trend_name(
        title: impl Into<String>,
        value: impl Into<String>,
        trend: &str,
    ) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            trend: Trend::parse(trend),
        }
    }

    /// Render the card as text
    pub fn render(&self) -> String {
        match self.trend {
            Some(trend) => format!("{}\n  {} {}", self.title, self.value, trend.indicator()),
            None => format!("{}\n  {}", self.title, self.value),
        }
    }
}

impl std::fmt::Display for MetricCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_formatting() {
        assert_eq!(format_percent(Some(72.0)), "72%");
        assert_eq!(format_percent(Some(33.5)), "33.5%");
        assert_eq!(format_score(Some(8.0)), "8/10");
        assert_eq!(format_score(Some(7.25)), "7.25/10");
        assert_eq!(format_percent(None), "—%");
    }

    #[test]
    fn test_render_with_indicator() {
        let card = MetricCard::new("Crowd Density", "72%", Trend::Increasing);
        assert_eq!(card.render(), "Crowd Density\n  72% ↑");
        assert_eq!(card.to_string(), card.render());
    }

    #[test]
    fn test_unknown_trend_renders_without_indicator() {
        let card = MetricCard::with_trend_name("Sentiment", "8/10", "wobbly");
        assert_eq!(card.trend, None);
        assert_eq!(card.render(), "Sentiment\n  8/10");

        let card = MetricCard::with_trend_name("Sentiment", "8/10", "decreasing");
        assert_eq!(card.render(), "Sentiment\n  8/10 ↓");
    }
}
