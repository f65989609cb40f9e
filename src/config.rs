//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default metrics source address
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default)]
    pub simulator: SimulatorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Live metrics feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_ws_url")]
    pub url: String,

    /// Capacity of the fan-out channel; slower subscribers skip ahead
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_string()
}

fn default_channel_capacity() -> usize {
    64
}

impl FeedConfig {
    /// Feed configuration for a specific endpoint with default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            channel_capacity: default_channel_capacity(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Reconnection policy for the live feed
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    /// When false a dropped connection simply stops delivering
    #[serde(default = "default_reconnect_enabled")]
    pub enabled: bool,

    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Fraction of each delay randomized in both directions (0.0 - 1.0)
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Consecutive failed attempts before giving up (unset = retry forever)
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_reconnect_enabled() -> bool {
    true
}

fn default_initial_delay() -> u64 {
    1000 // 1 second
}

fn default_max_delay() -> u64 {
    30_000 // 30 seconds
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.2
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: default_reconnect_enabled(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
            max_attempts: None,
        }
    }
}

/// Dashboard view configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// Time without a snapshot before the data is flagged stale
    #[serde(default = "default_stale_after")]
    pub stale_after_ms: u64,

    /// Deltas within this band count as stable
    #[serde(default)]
    pub trend_tolerance: f64,
}

fn default_stale_after() -> u64 {
    10_000 // 10 seconds
}

impl ViewConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            stale_after_ms: default_stale_after(),
            trend_tolerance: 0.0,
        }
    }
}

/// Metrics simulator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_sim_host")]
    pub host: String,

    #[serde(default = "default_sim_port")]
    pub port: u16,

    /// How often a synthetic snapshot is pushed (ms, 0 = never)
    #[serde(default = "default_sim_interval")]
    pub interval_ms: u64,

    #[serde(default = "default_sim_zones")]
    pub zones: Vec<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Seed for the synthetic random walk (unset = random)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_sim_host() -> String {
    "127.0.0.1".to_string()
}

fn default_sim_port() -> u16 {
    8080
}

fn default_sim_interval() -> u64 {
    1000
}

fn default_sim_zones() -> Vec<String> {
    vec![
        "main-stage".to_string(),
        "bar".to_string(),
        "entrance".to_string(),
    ]
}

fn default_max_connections() -> usize {
    100
}

impl SimulatorConfig {
    /// Socket address to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: default_sim_host(),
            port: default_sim_port(),
            interval_ms: default_sim_interval(),
            zones: default_sim_zones(),
            max_connections: default_max_connections(),
            seed: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("crowdpulse").join("config.toml")),
            Some(PathBuf::from("/etc/crowdpulse/config.toml")),
            Some(PathBuf::from("./crowdpulse.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Feed overrides
        if let Some(url) = lookup("CROWDPULSE_WS_URL") {
            self.feed.url = url;
        }
        if let Some(enabled) = lookup("CROWDPULSE_RECONNECT") {
            self.feed.reconnect.enabled = enabled.to_lowercase() != "false" && enabled != "0";
        }

        // View overrides
        if let Some(stale) = lookup("CROWDPULSE_STALE_AFTER_MS") {
            if let Ok(ms) = stale.parse() {
                self.view.stale_after_ms = ms;
            }
        }

        // Simulator overrides
        if let Some(host) = lookup("CROWDPULSE_SIM_HOST") {
            self.simulator.host = host;
        }
        if let Some(port) = lookup("CROWDPULSE_SIM_PORT") {
            if let Ok(p) = port.parse() {
                self.simulator.port = p;
            }
        }
        if let Some(interval) = lookup("CROWDPULSE_SIM_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.simulator.interval_ms = ms;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("CROWDPULSE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CROWDPULSE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# CrowdPulse Configuration
#
# Environment variables override these settings:
# - CROWDPULSE_WS_URL
# - CROWDPULSE_RECONNECT
# - CROWDPULSE_STALE_AFTER_MS
# - CROWDPULSE_SIM_HOST
# - CROWDPULSE_SIM_PORT
# - CROWDPULSE_SIM_INTERVAL_MS
# - CROWDPULSE_LOG_LEVEL
# - CROWDPULSE_LOG_FORMAT

[feed]
# Metrics source WebSocket address
url = "ws://localhost:8080"

# Buffered events per subscriber before it skips ahead
channel_capacity = 64

[feed.reconnect]
# Reconnect after the connection drops
enabled = true

# First retry delay (ms), doubled on every failure
initial_delay_ms = 1000

# Upper bound for the retry delay (ms)
max_delay_ms = 30000

# Growth factor between attempts
multiplier = 2.0

# Random spread applied to each delay (0.0 - 1.0)
jitter = 0.2

# Give up after this many consecutive failures (omit to retry forever)
# max_attempts = 10

[view]
# Flag data as stale after this long without a snapshot (ms)
stale_after_ms = 10000

# Changes smaller than this count as stable
trend_tolerance = 0.0

[simulator]
host = "127.0.0.1"
port = 8080

# Push a synthetic snapshot this often (ms)
interval_ms = 1000

zones = ["main-stage", "bar", "entrance"]
max_connections = 100

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
