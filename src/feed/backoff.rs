//! Reconnect backoff
//!
//! Exponential delays with jitter between connection attempts.

use std::time::Duration;

use crate::config::ReconnectConfig;

/// Reconnect timing parameters, normalized from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    pub jitter: f64,
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    pub fn new(initial_ms: u64, max_ms: u64) -> Self {
        let initial = Duration::from_millis(initial_ms.max(1));
        let max = Duration::from_millis(max_ms.max(initial_ms.max(1)));
        Self {
            initial,
            max,
            multiplier: 2.0,
            jitter: 0.0,
            max_attempts: None,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        let mut policy = Self::new(config.initial_delay_ms, config.max_delay_ms);
        policy.multiplier = if config.multiplier.is_finite() {
            config.multiplier.max(1.0)
        } else {
            2.0
        };
        policy.jitter = if config.jitter.is_finite() {
            config.jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        policy.max_attempts = config.max_attempts;
        policy
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Exponential backoff with jitter between reconnect attempts.
pub struct Backoff {
    policy: ReconnectPolicy,
    current: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        let current = policy.initial;
        Self {
            policy,
            current,
            attempt: 0,
        }
    }

    /// Record a failure and return the delay before the next attempt, or
    /// `None` once the attempt budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.next_delay_with(rand::random::<f64>())
    }

    /// Same as [`Backoff::next_delay`] with an explicit jitter sample in `[0, 1)`.
    pub fn next_delay_with(&mut self, sample: f64) -> Option<Duration> {
        if let Some(max_attempts) = self.policy.max_attempts {
            if self.attempt >= max_attempts {
                return None;
            }
        }
        self.attempt += 1;

        let base_ms = self.current.as_millis() as f64;
        let spread = self.policy.jitter * (2.0 * sample.clamp(0.0, 1.0) - 1.0);
        let delay = Duration::from_millis((base_ms * (1.0 + spread)).round() as u64);

        let grown = Duration::from_millis((base_ms * self.policy.multiplier).round() as u64);
        self.current = grown.min(self.policy.max);
        Some(delay.min(self.policy.max))
    }

    /// Reset after a successful connect.
    pub fn reset(&mut self) {
        self.current = self.policy.initial;
        self.attempt = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grows_geometrically_and_caps() {
        let mut backoff = Backoff::new(ReconnectPolicy::new(100, 1000));

        let delays: Vec<u128> = (0..6)
            .map(|_| backoff.next_delay_with(0.5).unwrap().as_millis())
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1000, 1000]);
        assert_eq!(backoff.attempt(), 6);
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = ReconnectPolicy::new(1000, 60_000).with_jitter(0.2);

        let mut low = Backoff::new(policy.clone());
        assert_eq!(low.next_delay_with(0.0), Some(Duration::from_millis(800)));

        let mut high = Backoff::new(policy.clone());
        let delay = high.next_delay_with(1.0).unwrap();
        assert_eq!(delay, Duration::from_millis(1200));

        let mut random = Backoff::new(policy);
        for _ in 0..20 {
            random.reset();
            let delay = random.next_delay().unwrap();
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1200));
        }
    }

    #[test]
    fn test_jitter_never_exceeds_max() {
        let mut backoff = Backoff::new(ReconnectPolicy::new(1000, 1000).with_jitter(0.5));
        assert_eq!(backoff.next_delay_with(1.0), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_reset_after_success() {
        let mut backoff = Backoff::new(ReconnectPolicy::new(50, 10_000));
        backoff.next_delay_with(0.5);
        backoff.next_delay_with(0.5);
        backoff.reset();

        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay_with(0.5), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut backoff = Backoff::new(ReconnectPolicy::new(10, 100).with_max_attempts(2));
        assert!(backoff.next_delay_with(0.5).is_some());
        assert!(backoff.next_delay_with(0.5).is_some());
        assert!(backoff.next_delay_with(0.5).is_none());
    }

    #[test]
    fn test_from_config_normalizes() {
        let config = ReconnectConfig {
            enabled: true,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 0.5,
            jitter: 3.0,
            max_attempts: Some(4),
        };
        let policy = ReconnectPolicy::from_config(&config);

        assert_eq!(policy.initial, Duration::from_millis(1));
        assert_eq!(policy.max, Duration::from_millis(1));
        assert_eq!(policy.multiplier, 1.0);
        assert_eq!(policy.jitter, 1.0);
        assert_eq!(policy.max_attempts, Some(4));
    }
}
