use std::fmt;

use time::OffsetDateTime;

/// One telemetry reading as reported by the device.
///
/// Every field is optional because firmware versions differ in what they
/// report. Whether a missing field matters is decided by the safety
/// monitor, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub timestamp: OffsetDateTime,
    /// Hashrate in GH/s.
    pub hashrate_ghs: Option<f64>,
    pub chip_temp_c: Option<f64>,
    /// Voltage regulator temperature; absent on boards without a sensor.
    pub vr_temp_c: Option<f64>,
    /// Supply (input) voltage in millivolts.
    pub input_voltage_mv: Option<f64>,
    pub power_w: Option<f64>,
}

/// Telemetry fields the tuner can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryField {
    HashRate,
    ChipTemperature,
    Power,
}

impl fmt::Display for TelemetryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TelemetryField::HashRate => "hashRate",
            TelemetryField::ChipTemperature => "temp",
            TelemetryField::Power => "power",
        };
        f.write_str(name)
    }
}
