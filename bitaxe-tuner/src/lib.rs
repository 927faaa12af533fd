//! Closed-loop voltage/frequency tuner for Bitaxe miners.
//!
//! The tuner walks a single device through a sequence of (core voltage,
//! frequency) settings, samples telemetry at each one, and stops at the
//! first safety or stability limit. Whatever happens, the device is left
//! on the best setting found or on the settings it started with.

pub mod api_client;
pub mod config;
pub mod ranking;
pub mod recovery;
pub mod results;
pub mod retry;
pub mod safety;
pub mod sampler;
pub mod session;
pub mod sweep;
pub mod tracing;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
