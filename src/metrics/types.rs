//! Engagement data types
//!
//! This module defines the snapshot pushed by the metrics source:
//! - `EngagementMetrics`: One immutable reading of the whole venue
//! - `ZoneMetrics`: Per-zone density and movement
//! - `User` and `Event`: Reference shapes owned by other services
//!
//! Decoding is lenient. Every field may be missing on the wire; a missing
//! scalar decodes to `None` and is passed through to rendering untouched.

use serde::{Deserialize, Serialize};

/// A single engagement snapshot
///
/// A new snapshot always replaces the previous one as a whole. Nothing is
/// merged field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    /// Unix timestamp in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Crowd density, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crowd_density: Option<f64>,
    /// Sentiment score, observed range 0-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
    /// Energy level, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<f64>,
    /// Zone readings in arrival order (zone IDs may repeat)
    #[serde(default)]
    pub zone_data: Vec<ZoneMetrics>,
}

impl EngagementMetrics {
    /// Create a snapshot with all headline values present
    pub fn new(timestamp: i64, crowd_density: f64, sentiment: f64, energy_level: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            crowd_density: Some(crowd_density),
            sentiment: Some(sentiment),
            energy_level: Some(energy_level),
            zone_data: Vec::new(),
        }
    }

    /// Builder method: append a zone reading
    pub fn zone(mut self, zone: ZoneMetrics) -> Self {
        self.zone_data.push(zone);
        self
    }

    /// Decode a snapshot from a JSON text payload
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decode a snapshot from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encode the snapshot as a JSON text payload
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Readings for one zone, in arrival order
    pub fn zone_readings<'a>(&'a self, zone_id: &'a str) -> impl Iterator<Item = &'a ZoneMetrics> {
        self.zone_data.iter().filter(move |z| z.zone_id == zone_id)
    }
}

/// Density and movement for one spatial zone of the venue
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMetrics {
    /// Opaque zone identifier
    #[serde(default)]
    pub zone_id: String,
    /// Zone density, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    /// Movement reading; the unit is defined by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<f64>,
}

impl ZoneMetrics {
    pub fn new(zone_id: impl Into<String>, density: f64, movement: f64) -> Self {
        Self {
            zone_id: zone_id.into(),
            density: Some(density),
            movement: Some(movement),
        }
    }
}

/// Role of a user in the identity directory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Dj,
    Organizer,
    Manager,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Dj => write!(f, "dj"),
            UserRole::Organizer => write!(f, "organizer"),
            UserRole::Manager => write!(f, "manager"),
        }
    }
}

/// A user record owned by the identity directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: UserRole,
}

/// An event record owned by the event registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    /// Event date as sent by the registry
    pub date: String,
    pub venue: String,
    pub capacity: u32,
    pub organizer_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_payload() {
        let json = r#"{"timestamp":1000,"crowdDensity":72,"sentiment":8,"energyLevel":65,"zoneData":[]}"#;
        let metrics = EngagementMetrics::from_json(json).unwrap();

        assert_eq!(metrics.timestamp, Some(1000));
        assert_eq!(metrics.crowd_density, Some(72.0));
        assert_eq!(metrics.sentiment, Some(8.0));
        assert_eq!(metrics.energy_level, Some(65.0));
        assert!(metrics.zone_data.is_empty());
    }

    #[test]
    fn test_decode_missing_fields_pass_through() {
        let json = r#"{"timestamp":1000,"crowdDensity":40,"sentiment":7}"#;
        let metrics = EngagementMetrics::from_json(json).unwrap();

        assert_eq!(metrics.crowd_density, Some(40.0));
        assert_eq!(metrics.energy_level, None);
        assert!(metrics.zone_data.is_empty());
    }

    #[test]
    fn test_decode_keeps_zone_order_and_duplicates() {
        let json = r#"{
            "timestamp": 5,
            "crowdDensity": 10,
            "sentiment": 2,
            "energyLevel": 30,
            "zoneData": [
                {"zoneId": "stage", "density": 90, "movement": 1.5},
                {"zoneId": "bar", "density": 40, "movement": 0.2},
                {"zoneId": "stage", "density": 85, "movement": 1.1}
            ]
        }"#;
        let metrics = EngagementMetrics::from_json(json).unwrap();

        let ids: Vec<_> = metrics.zone_data.iter().map(|z| z.zone_id.as_str()).collect();
        assert_eq!(ids, vec!["stage", "bar", "stage"]);
        assert_eq!(metrics.zone_readings("stage").count(), 2);
        assert_eq!(metrics.zone_data[1].movement, Some(0.2));
    }

    #[test]
    fn test_decode_rejects_non_object_payloads() {
        assert!(EngagementMetrics::from_json("not json").is_err());
        assert!(EngagementMetrics::from_json("null").is_err());
        assert!(EngagementMetrics::from_json("42").is_err());
        assert!(EngagementMetrics::from_json(r#"{"crowdDensity":"high"}"#).is_err());
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let metrics = EngagementMetrics::new(1000, 55.0, 5.0, 30.0)
            .zone(ZoneMetrics::new("entrance", 20.0, 0.4));
        let json = metrics.to_json().unwrap();

        assert!(json.contains("\"crowdDensity\":55.0"));
        assert!(json.contains("\"energyLevel\":30.0"));
        assert!(json.contains("\"zoneId\":\"entrance\""));
        assert_eq!(EngagementMetrics::from_slice(json.as_bytes()).unwrap(), metrics);
    }

    #[test]
    fn test_reference_shapes() {
        let user: User = serde_json::from_str(r#"{"id":"u1","name":"Sam","role":"dj"}"#).unwrap();
        assert_eq!(user.role, UserRole::Dj);
        assert_eq!(user.role.to_string(), "dj");

        let event: Event = serde_json::from_str(
            r#"{"id":"e1","name":"Night Shift","date":"2024-06-01","venue":"Warehouse","capacity":800,"organizerId":"u2"}"#,
        )
        .unwrap();
        assert_eq!(event.capacity, 800);
        assert_eq!(event.organizer_id, "u2");

        assert!(serde_json::from_str::<User>(r#"{"id":"u1","name":"Sam","role":"bouncer"}"#).is_err());
    }
}
