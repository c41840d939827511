//! Simulation clock and time scaling.
//!
//! The clock is the single source of truth for simulated time. Every frame
//! step is clamped to the configured maximum (so a stalled host cannot make
//! a front tunnel through an obstacle) and then multiplied by the host's
//! time scale. Signal and warrant ages are measured against this clock, so
//! slowing time slows their lifecycle too.

use std::time::Duration;

/// Time scale presets offered to the host.
pub const TIME_SCALE_PRESETS: [f64; 5] = [0.01, 0.1, 0.25, 1.0, 4.0];

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The requested time scale is not a finite positive number.
    #[error("invalid time scale {scale}: must be finite and positive")]
    InvalidTimeScale {
        /// The rejected value.
        scale: f64,
    },

    /// The maximum frame step is zero.
    #[error("maximum frame step must be positive")]
    ZeroMaxStep,
}

/// Simulated time with a clamped, scaled frame step.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    /// Simulated seconds since the clock was created or reset.
    now: f64,
    /// Multiplier applied to each clamped frame step.
    time_scale: f64,
    /// Largest raw frame step accepted, in seconds.
    max_step: f64,
    /// Number of frames advanced.
    frames: u64,
}

impl SimClock {
    /// Create a clock at time zero.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidTimeScale`] for a non-finite or
    /// non-positive scale, or [`ClockError::ZeroMaxStep`] if `max_step` is
    /// zero.
    pub fn new(time_scale: f64, max_step: Duration) -> Result<Self, ClockError> {
        validate_scale(time_scale)?;
        if max_step.is_zero() {
            return Err(ClockError::ZeroMaxStep);
        }
        Ok(Self {
            now: 0.0,
            time_scale,
            max_step: max_step.as_secs_f64(),
            frames: 0,
        })
    }

    /// Advance by one frame whose raw duration was `raw_dt` seconds.
    ///
    /// Returns the simulated step actually applied: `min(raw_dt, max_step)`
    /// times the time scale. Negative or non-finite input counts as zero.
    pub fn advance_frame(&mut self, raw_dt: f64) -> f64 {
        let raw = if raw_dt.is_finite() { raw_dt.max(0.0) } else { 0.0 };
        let clamped = raw.min(self.max_step);
        let dt = clamped * self.time_scale;
        self.now += dt;
        self.frames = self.frames.saturating_add(1);
        dt
    }

    /// Whether a raw step of `raw_dt` seconds would be clamped.
    pub const fn would_clamp(&self, raw_dt: f64) -> bool {
        raw_dt > self.max_step
    }

    /// Simulated seconds elapsed.
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Frames advanced so far.
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Current time scale.
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Set the time scale.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidTimeScale`] and leaves the scale
    /// unchanged for a non-finite or non-positive value.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), ClockError> {
        validate_scale(scale)?;
        self.time_scale = scale;
        Ok(())
    }

    /// Return to real time (scale 1).
    pub const fn reset_time_scale(&mut self) {
        self.time_scale = 1.0;
    }

    /// The preset nearest the current scale.
    pub fn nearest_preset(&self) -> f64 {
        TIME_SCALE_PRESETS
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - self.time_scale)
                    .abs()
                    .total_cmp(&(b - self.time_scale).abs())
            })
            .unwrap_or(1.0)
    }
}

const fn validate_scale(scale: f64) -> Result<(), ClockError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(ClockError::InvalidTimeScale { scale })
    }
}
