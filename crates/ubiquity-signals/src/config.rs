//! Tunables for the signal/warrant state machine.
//!
//! These values live under the `signals` key of `ubiquity-config.yaml`.
//! Every field defaults to the constant the engine was calibrated with, so
//! an absent or partial section behaves exactly like the defaults.

use serde::Deserialize;

/// Configuration for signal accrual and warrant minting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalsConfig {
    /// Simulated seconds before a signal expires (default: 20).
    #[serde(default = "default_signal_ttl_secs")]
    pub signal_ttl_secs: f64,

    /// Simulated seconds before a live warrant is retired (default: 30).
    #[serde(default = "default_warrant_ttl_secs")]
    pub warrant_ttl_secs: f64,

    /// Rolling window for harmonic triad detection (default: 5).
    #[serde(default = "default_triad_window_secs")]
    pub triad_window_secs: f64,

    /// Volume an active signal must exceed to mint a warrant (default: 0.8).
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: f64,

    /// Breach risk above which a circuit breaker is minted (default: 0.25).
    #[serde(default = "default_circuit_breaker_risk")]
    pub circuit_breaker_risk: f64,

    /// Volume per second added per unit of linked warrant priority
    /// (default: 0.03).
    #[serde(default = "default_warrant_amplification")]
    pub warrant_amplification: f64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            signal_ttl_secs: default_signal_ttl_secs(),
            warrant_ttl_secs: default_warrant_ttl_secs(),
            triad_window_secs: default_triad_window_secs(),
            volume_threshold: default_volume_threshold(),
            circuit_breaker_risk: default_circuit_breaker_risk(),
            warrant_amplification: default_warrant_amplification(),
        }
    }
}

const fn default_signal_ttl_secs() -> f64 {
    20.0
}

const fn default_warrant_ttl_secs() -> f64 {
    30.0
}

const fn default_triad_window_secs() -> f64 {
    5.0
}

const fn default_volume_threshold() -> f64 {
    0.8
}

const fn default_circuit_breaker_risk() -> f64 {
    0.25
}

const fn default_warrant_amplification() -> f64 {
    0.03
}
