//! Core value types shared across the tuner.

mod device;
mod measurement;
mod point;
mod telemetry;

pub use device::{DeviceCapability, DeviceDefaults};
pub use measurement::{
    BenchmarkEntry, BenchmarkResults, FailureReason, IterationMeasurement, Measurement,
};
pub use point::SweepPoint;
pub use telemetry::{TelemetryField, TelemetrySample};
