//! Configuration loading and typed config structures for the Ubiquity
//! simulation.
//!
//! The canonical configuration lives in `ubiquity-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads and validates the file.
//! Every key is optional; absent keys take the calibrated defaults.

use std::path::Path;

use serde::Deserialize;
use ubiquity_signals::SignalsConfig;
use ubiquity_types::Mode;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its valid range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending key.
        field: &'static str,
        /// Explanation of what is wrong with the value.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `ubiquity-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World dimensions, seed, and starting mode.
    #[serde(default)]
    pub world: WorldConfig,

    /// Frame and tick cadence.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Signal/warrant state machine tunables.
    #[serde(default)]
    pub signals: SignalsConfig,

    /// Field controller tunables.
    #[serde(default)]
    pub field: FieldConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Headless engine run parameters.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        for (field, value) in [
            ("timing.frame_interval_ms", t.frame_interval_ms),
            ("timing.max_frame_step_ms", t.max_frame_step_ms),
            ("timing.state_tick_ms", t.state_tick_ms),
            ("timing.mint_tick_ms", t.mint_tick_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "interval must be at least 1 ms".to_owned(),
                });
            }
        }
        if !(t.time_scale.is_finite() && t.time_scale > 0.0) {
            return Err(ConfigError::Invalid {
                field: "timing.time_scale",
                reason: format!("{} is not a finite positive scale", t.time_scale),
            });
        }
        let sig = &self.signals;
        for (field, value) in [
            ("signals.signal_ttl_secs", sig.signal_ttl_secs),
            ("signals.warrant_ttl_secs", sig.warrant_ttl_secs),
            ("signals.triad_window_secs", sig.triad_window_secs),
            ("signals.volume_threshold", sig.volume_threshold),
            ("signals.circuit_breaker_risk", sig.circuit_breaker_risk),
            ("signals.warrant_amplification", sig.warrant_amplification),
            ("field.penalty_max", self.field.penalty_max),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is not a finite non-negative value"),
                });
            }
        }
        for (field, value) in [
            ("world.width", self.world.width),
            ("world.height", self.world.height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is not a positive extent"),
                });
            }
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Seed for every random source in the simulation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// World width in pixels.
    #[serde(default = "default_width")]
    pub width: f64,

    /// World height in pixels.
    #[serde(default = "default_height")]
    pub height: f64,

    /// Mode the scene is seeded in.
    #[serde(default)]
    pub initial_mode: Mode,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            width: default_width(),
            height: default_height(),
            initial_mode: Mode::default(),
        }
    }
}

/// Frame and tick cadence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimingConfig {
    /// Real-time milliseconds between animation frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Upper bound on a single frame step before time scaling.
    #[serde(default = "default_max_frame_step_ms")]
    pub max_frame_step_ms: u64,

    /// Real-time milliseconds between signal state ticks.
    #[serde(default = "default_state_tick_ms")]
    pub state_tick_ms: u64,

    /// Real-time milliseconds between minting ticks.
    #[serde(default = "default_mint_tick_ms")]
    pub mint_tick_ms: u64,

    /// Initial time scale applied to frame steps.
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            max_frame_step_ms: default_max_frame_step_ms(),
            state_tick_ms: default_state_tick_ms(),
            mint_tick_ms: default_mint_tick_ms(),
            time_scale: default_time_scale(),
        }
    }
}

/// Field controller configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldConfig {
    /// Maximum soft-block penalty for a task with no satisfied requirement.
    #[serde(default = "default_penalty_max")]
    pub penalty_max: f64,

    /// Soft-block decay horizon in milliseconds. Reported to the host only.
    #[serde(default = "default_soft_block_decay_ms")]
    pub soft_block_decay_ms: u64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            penalty_max: default_penalty_max(),
            soft_block_decay_ms: default_soft_block_decay_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Headless engine run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Wall-clock seconds to run before shutting down (0 = until Ctrl-C).
    #[serde(default = "default_run_secs")]
    pub run_secs: u64,

    /// Seconds between scripted broadcasts (0 = never).
    #[serde(default = "default_broadcast_every_secs")]
    pub broadcast_every_secs: u64,

    /// Seconds between snapshot reports in the log (0 = never).
    #[serde(default = "default_report_every_secs")]
    pub report_every_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_secs: default_run_secs(),
            broadcast_every_secs: default_broadcast_every_secs(),
            report_every_secs: default_report_every_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_width() -> f64 {
    800.0
}

const fn default_height() -> f64 {
    560.0
}

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_max_frame_step_ms() -> u64 {
    50
}

const fn default_state_tick_ms() -> u64 {
    100
}

const fn default_mint_tick_ms() -> u64 {
    500
}

const fn default_time_scale() -> f64 {
    1.0
}

const fn default_penalty_max() -> f64 {
    0.7
}

const fn default_soft_block_decay_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_run_secs() -> u64 {
    60
}

const fn default_broadcast_every_secs() -> u64 {
    2
}

const fn default_report_every_secs() -> u64 {
    5
}
