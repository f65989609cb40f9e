//! Synthetic metrics
//!
//! Produces a plausible stream of snapshots as a bounded random walk so a
//! dashboard can be exercised without a real venue.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::metrics::{EngagementMetrics, ZoneMetrics};

/// Random-walk generator for engagement snapshots
pub struct MetricsGenerator {
    rng: StdRng,
    zones: Vec<String>,
    crowd_density: f64,
    sentiment: f64,
    energy_level: f64,
}

impl MetricsGenerator {
    /// Create a generator; a seed makes the sequence reproducible
    pub fn new(zones: Vec<String>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            rng,
            zones,
            crowd_density: 50.0,
            sentiment: 6.0,
            energy_level: 50.0,
        }
    }

    /// Next snapshot in the walk
    pub fn next_snapshot(&mut self, timestamp: i64) -> EngagementMetrics {
        self.crowd_density = step(&mut self.rng, self.crowd_density, 4.0, 0.0, 100.0);
        self.sentiment = step(&mut self.rng, self.sentiment, 0.5, 0.0, 10.0);
        self.energy_level = step(&mut self.rng, self.energy_level, 5.0, 0.0, 100.0);

        let mut snapshot = EngagementMetrics::new(
            timestamp,
            self.crowd_density.round(),
            round_to_tenth(self.sentiment),
            self.energy_level.round(),
        );

        for zone in &self.zones {
            let density = (self.crowd_density + self.rng.random_range(-15.0..=15.0)).clamp(0.0, 100.0);
            let movement = self.rng.random_range(0.0..=2.0);
            snapshot = snapshot.zone(ZoneMetrics::new(
                zone.clone(),
                density.round(),
                round_to_tenth(movement),
            ));
        }

        snapshot
    }
}

fn step(rng: &mut StdRng, value: f64, max_step: f64, min: f64, max: f64) -> f64 {
    (value + rng.random_range(-max_step..=max_step)).clamp(min, max)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
