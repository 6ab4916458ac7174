//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `occupancy-timer.toml` in the working directory, or at the path
//! in `OCCUPANCY_TIMER_CONFIG`. Every field has a sensible default so the
//! file is optional. Environment variables take precedence over file values.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use occupancy_timer_adapter_virtual::Simulation;
use occupancy_timer_app::aggregator::AggregatorSettings;
use occupancy_timer_domain::accessory::AccessoryConfig;
use occupancy_timer_domain::delay::Delay;

const DEFAULT_PATH: &str = "occupancy-timer.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Countdown and polling settings shared by every accessory.
    pub timer: TimerConfig,
    /// Accessories to host.
    pub accessories: Vec<AccessoryEntry>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// How often a running countdown re-evaluates the remaining time.
    pub tick_interval_ms: u64,
    /// Upper bound on a single switch read.
    pub read_timeout_ms: u64,
}

/// One `[[accessories]]` table.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AccessoryEntry {
    pub name: String,
    /// Clamped to `1..=AccessoryConfig::MAX_SWITCHES`.
    pub slave_count: i64,
    pub delay: DelaySetting,
    pub protected_mode: bool,
    /// Simulated delay on every switch read.
    pub read_latency_ms: u64,
    /// Zero-based indices of switches whose reads fail.
    pub unreachable_switches: Vec<usize>,
}

/// A delay written as a number, as text, or as anything else TOML allows.
///
/// Fractions are truncated toward zero. Text is parsed leniently: leading
/// digits are used and anything else reads as zero. Values of any other
/// type read as zero. Every form is clamped to the supported range.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DelaySetting {
    Seconds(i64),
    Fraction(f64),
    Text(String),
    Other(toml::Value),
}

impl DelaySetting {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_delay(&self) -> Delay {
        match self {
            Self::Seconds(seconds) => Delay::clamped(*seconds),
            // `as` saturates and maps NaN to zero.
            Self::Fraction(seconds) => Delay::clamped(seconds.trunc() as i64),
            Self::Text(text) => Delay::parse_lenient(text),
            Self::Other(_) => Delay::ZERO,
        }
    }
}

impl Default for DelaySetting {
    fn default() -> Self {
        Self::Seconds(0)
    }
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("OCCUPANCY_TIMER_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.into());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("OCCUPANCY_TIMER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("OCCUPANCY_TIMER_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("OCCUPANCY_TIMER_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("OCCUPANCY_TIMER_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.timer.tick_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "timer.tick_interval_ms must be non-zero".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for entry in &self.accessories {
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "accessory name {:?} is used more than once",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            tick_interval: Duration::from_millis(self.timer.tick_interval_ms),
            read_timeout: Duration::from_millis(self.timer.read_timeout_ms),
        }
    }

    /// Accessory configurations, or a single default accessory when none
    /// are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a blank accessory name.
    pub fn accessory_configs(&self) -> Result<Vec<AccessoryConfig>, ConfigError> {
        if self.accessories.is_empty() {
            return Ok(vec![AccessoryConfig::default()]);
        }
        self.accessories
            .iter()
            .map(|entry| {
                AccessoryConfig::builder()
                    .name(entry.name.clone())
                    .slave_count(entry.slave_count)
                    .delay(entry.delay.to_delay())
                    .protected_mode(entry.protected_mode)
                    .build()
                    .map_err(|err| ConfigError::Validation(err.to_string()))
            })
            .collect()
    }

    /// Simulated switch behaviour for each entry of
    /// [`Config::accessory_configs`], in the same order.
    #[must_use]
    pub fn simulations(&self) -> Vec<Simulation> {
        if self.accessories.is_empty() {
            return vec![Simulation::default()];
        }
        self.accessories
            .iter()
            .map(|entry| Simulation {
                read_latency: Duration::from_millis(entry.read_latency_ms),
                unreachable: entry.unreachable_switches.clone(),
            })
            .collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "occupancy_timerd=info,occupancy_timer=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        let defaults = AggregatorSettings::default();
        Self {
            tick_interval_ms: u64::try_from(defaults.tick_interval.as_millis()).unwrap_or(250),
            read_timeout_ms: u64::try_from(defaults.read_timeout.as_millis()).unwrap_or(2_000),
        }
    }
}

impl Default for AccessoryEntry {
    fn default() -> Self {
        Self {
            name: AccessoryConfig::DEFAULT_NAME.to_string(),
            slave_count: 1,
            delay: DelaySetting::default(),
            protected_mode: false,
            read_latency_ms: 0,
            unreachable_switches: Vec::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
