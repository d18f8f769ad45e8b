//! Hall Controller configuration.
//!
//! Configuration is loaded from environment variables. Every value has a
//! default; values that are present but unparseable or out of range are
//! rejected so a bad deployment fails before any participant is spawned.

use common::config::{ObservabilityConfig, DEFAULT_LOG_LEVEL};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default participant population.
pub const DEFAULT_PARTICIPANT_COUNT: u32 = 300;

/// Default seats per room.
pub const DEFAULT_ROOM_CAPACITY: u32 = 30;

/// Default delay between spawning participants and opening the gate.
pub const DEFAULT_WARMUP_DELAY_MS: u64 = 1000;

/// Default hold time between opening the gate and ending the session.
pub const DEFAULT_SESSION_DURATION_MS: u64 = 3000;

/// Default maximum random delay before a participant reaches the gate.
pub const DEFAULT_ARRIVAL_JITTER_MS: u64 = 0;

/// Hall Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of participants in the event (default: 300).
    pub participant_count: u32,

    /// Seats per room (default: 30). Must be at least 1.
    pub room_capacity: u32,

    /// Delay before the gate opens (default: 1s).
    pub warmup_delay: Duration,

    /// Time the session is held open after the gate opens (default: 3s).
    pub session_duration: Duration,

    /// Upper bound of the random delay each participant waits before
    /// arriving at the gate (default: 0, arrive immediately).
    pub arrival_jitter: Duration,

    /// Logging configuration.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            participant_count: DEFAULT_PARTICIPANT_COUNT,
            room_capacity: DEFAULT_ROOM_CAPACITY,
            warmup_delay: Duration::from_millis(DEFAULT_WARMUP_DELAY_MS),
            session_duration: Duration::from_millis(DEFAULT_SESSION_DURATION_MS),
            arrival_jitter: Duration::from_millis(DEFAULT_ARRIVAL_JITTER_MS),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Create a validated configuration with default timings.
    pub fn new(participant_count: u32, room_capacity: u32) -> Result<Self, ConfigError> {
        let config = Self {
            participant_count,
            room_capacity,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let participant_count =
            parse_var(vars, "HC_PARTICIPANT_COUNT")?.unwrap_or(DEFAULT_PARTICIPANT_COUNT);

        let room_capacity = parse_var(vars, "HC_ROOM_CAPACITY")?.unwrap_or(DEFAULT_ROOM_CAPACITY);

        let warmup_delay = Duration::from_millis(
            parse_var(vars, "HC_WARMUP_DELAY_MS")?.unwrap_or(DEFAULT_WARMUP_DELAY_MS),
        );

        let session_duration = Duration::from_millis(
            parse_var(vars, "HC_SESSION_DURATION_MS")?.unwrap_or(DEFAULT_SESSION_DURATION_MS),
        );

        let arrival_jitter = Duration::from_millis(
            parse_var(vars, "HC_ARRIVAL_JITTER_MS")?.unwrap_or(DEFAULT_ARRIVAL_JITTER_MS),
        );

        let observability = ObservabilityConfig {
            log_level: vars
                .get("HC_LOG_LEVEL")
                .cloned()
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            json_logs: parse_var(vars, "HC_LOG_JSON")?.unwrap_or(false),
        };

        let config = Config {
            participant_count,
            room_capacity,
            warmup_delay,
            session_duration,
            arrival_jitter,
            observability,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject parameters that cannot describe an event.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participant_count == 0 {
            return Err(ConfigError::InvalidValue(
                "HC_PARTICIPANT_COUNT must be >= 1".to_string(),
            ));
        }
        if self.room_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "HC_ROOM_CAPACITY must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of rooms needed to seat every participant at capacity.
    #[must_use]
    pub fn room_count(&self) -> u32 {
        self.participant_count.div_ceil(self.room_capacity.max(1))
    }

    /// Set the warm-up delay.
    #[must_use]
    pub fn with_warmup_delay(mut self, delay: Duration) -> Self {
        self.warmup_delay = delay;
        self
    }

    /// Set the session duration.
    #[must_use]
    pub fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    /// Set the arrival jitter bound.
    #[must_use]
    pub fn with_arrival_jitter(mut self, jitter: Duration) -> Self {
        self.arrival_jitter = jitter;
        self
    }
}

fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    vars.get(name)
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue(format!("{name} has unparseable value '{raw}'"))
            })
        })
        .transpose()
}
