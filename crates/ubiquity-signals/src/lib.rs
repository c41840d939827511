//! Signal volume accrual, warrant minting, and lifecycle tracking for the
//! Ubiquity simulation.
//!
//! Signals are semantic events that accrue "volume" over time. Loud
//! signals, co-occurring signal kinds, and global breach risk mint
//! warrants: obligations carrying a stake bond. This crate owns that state
//! machine and the pure views derived from it.
//!
//! # Modules
//!
//! - [`config`] -- [`SignalsConfig`] tunables (TTLs, thresholds, window).
//! - [`engine`] -- [`SignalEngine`]: state tick, minting tick, operator
//!   commands, and hard reset.
//! - [`views`] -- Signal census and warrant lifecycle views.
//!
//! [`SignalsConfig`]: config::SignalsConfig
//! [`SignalEngine`]: engine::SignalEngine

pub mod config;
pub mod engine;
pub mod views;

// Re-export primary types at crate root.
pub use config::SignalsConfig;
pub use engine::{LifecycleCounters, MintReport, SignalEngine, StateTickReport};
pub use views::{census, warrant_lifecycle};
