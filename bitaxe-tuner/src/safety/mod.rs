//! Per-sample safety envelope.
//!
//! The monitor is a pure function of one telemetry sample and the
//! configured limits. It holds no history: a single bad reading is enough
//! to abort the sampling window.

mod config;
mod monitor;

pub use config::{InputVoltageRange, SafetyLimits};
pub use monitor::{SafetyMonitor, ValidatedSample, Violation};
