//! AxeOS API data transfer objects.
//!
//! Field names follow the firmware's JSON (`/api/system/info` and
//! `PATCH /api/system`).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::tracing::prelude::*;
use crate::types::{DeviceCapability, DeviceDefaults, SweepPoint, TelemetrySample};

/// Used when the firmware omits `coreVoltage`.
pub const FALLBACK_CORE_VOLTAGE_MV: u32 = 1150;

/// Used when the firmware omits `frequency`.
pub const FALLBACK_FREQUENCY_MHZ: u32 = 500;

/// Subset of `GET /api/system/info` the tuner reads.
///
/// Everything is optional; older firmware lacks `vrTemp`, and boards in a
/// bad state may drop telemetry fields entirely.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// Chip temperature (°C).
    pub temp: Option<f64>,
    /// Voltage regulator temperature (°C).
    pub vr_temp: Option<f64>,
    /// Input voltage (mV).
    pub voltage: Option<f64>,
    /// Hashrate (GH/s).
    pub hash_rate: Option<f64>,
    /// Power draw (W).
    pub power: Option<f64>,
    /// Configured core voltage (mV).
    pub core_voltage: Option<f64>,
    /// Configured ASIC frequency (MHz).
    pub frequency: Option<f64>,
    pub small_core_count: Option<u32>,
    pub asic_count: Option<u32>,
}

impl SystemInfo {
    pub fn to_sample(&self, timestamp: OffsetDateTime) -> TelemetrySample {
        TelemetrySample {
            timestamp,
            hashrate_ghs: self.hash_rate,
            chip_temp_c: self.temp,
            vr_temp_c: self.vr_temp,
            input_voltage_mv: self.voltage,
            power_w: self.power,
        }
    }

    /// Current settings and topology, with fallbacks for missing fields.
    pub fn to_defaults(&self) -> DeviceDefaults {
        let core_voltage_mv = self.core_voltage.map(|v| v.round() as u32).unwrap_or_else(|| {
            warn!(
                fallback_mv = FALLBACK_CORE_VOLTAGE_MV,
                "Device did not report coreVoltage"
            );
            FALLBACK_CORE_VOLTAGE_MV
        });
        let frequency_mhz = self.frequency.map(|f| f.round() as u32).unwrap_or_else(|| {
            warn!(
                fallback_mhz = FALLBACK_FREQUENCY_MHZ,
                "Device did not report frequency"
            );
            FALLBACK_FREQUENCY_MHZ
        });

        if self.small_core_count.is_none() || self.asic_count.is_none() {
            warn!("Device did not report its core topology; expected hashrate will be zero");
        }

        DeviceDefaults {
            point: SweepPoint::new(core_voltage_mv, frequency_mhz),
            capability: DeviceCapability {
                small_core_count: self.small_core_count.unwrap_or(0),
                asic_count: self.asic_count.unwrap_or(0),
            },
        }
    }
}

/// Body of `PATCH /api/system`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub core_voltage: u32,
    pub frequency: u32,
}

impl From<SweepPoint> for SettingsPatch {
    fn from(point: SweepPoint) -> Self {
        Self {
            core_voltage: point.core_voltage_mv,
            frequency: point.frequency_mhz,
        }
    }
}
