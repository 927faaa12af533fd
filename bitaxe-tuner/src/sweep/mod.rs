//! Voltage/frequency search.
//!
//! The controller raises frequency while the measured hashrate keeps up
//! with the theoretical rate, trades a frequency step for a voltage step
//! when it falls behind, and stops at the first failure or bound.

mod config;
mod controller;

pub use config::SweepConfig;
pub use controller::{StopReason, SweepController, SweepState};
