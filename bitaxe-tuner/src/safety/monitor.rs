use strum::IntoStaticStr;
use thiserror::Error;

use super::config::SafetyLimits;
use crate::tracing::prelude::*;
use crate::types::{SweepPoint, TelemetryField, TelemetrySample};

/// Reason a sample falls outside the safety envelope.
///
/// Variants are listed in check order; a sample that breaks several
/// limits reports only the first.
#[derive(Debug, Clone, PartialEq, Error, IntoStaticStr)]
pub enum Violation {
    #[error("{0} not reported by device")]
    #[strum(serialize = "DATA_UNAVAILABLE")]
    DataUnavailable(TelemetryField),

    #[error("chip temperature {temp_c}°C is below {floor_c}°C, check the sensor")]
    #[strum(serialize = "TEMPERATURE_BELOW_FLOOR")]
    SensorAnomaly { temp_c: f64, floor_c: f64 },

    #[error("chip temperature {temp_c}°C reached limit {max_c}°C")]
    #[strum(serialize = "CHIP_TEMP_EXCEEDED")]
    ChipOverTemp { temp_c: f64, max_c: f64 },

    #[error("voltage regulator temperature {temp_c}°C reached limit {max_c}°C")]
    #[strum(serialize = "VR_TEMP_EXCEEDED")]
    VrOverTemp { temp_c: f64, max_c: f64 },

    #[error("input voltage {voltage_mv}mV outside {min_mv}..={max_mv}mV")]
    #[strum(serialize = "INPUT_VOLTAGE_OUT_OF_RANGE")]
    InputVoltageOutOfRange {
        voltage_mv: f64,
        min_mv: f64,
        max_mv: f64,
    },

    #[error("power draw {power_w}W exceeds limit {max_w}W")]
    #[strum(serialize = "POWER_CONSUMPTION_EXCEEDED")]
    PowerExceeded { power_w: f64, max_w: f64 },
}

impl Violation {
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

/// A sample that passed every check, with required fields unwrapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedSample {
    pub hashrate_ghs: f64,
    pub chip_temp_c: f64,
    pub vr_temp_c: Option<f64>,
    pub input_voltage_mv: Option<f64>,
    pub power_w: f64,
}

#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    limits: SafetyLimits,
}

impl SafetyMonitor {
    pub fn new(limits: SafetyLimits) -> Self {
        Self { limits }
    }

    /// Evaluate one sample taken while `point` was applied.
    pub fn check(
        &self,
        sample: &TelemetrySample,
        point: SweepPoint,
    ) -> Result<ValidatedSample, Violation> {
        self.evaluate(sample)
            .inspect_err(|v| trace!(%point, code = v.code(), "Sample outside limits"))
    }

    fn evaluate(&self, sample: &TelemetrySample) -> Result<ValidatedSample, Violation> {
        let limits = &self.limits;

        let chip_temp_c = sample
            .chip_temp_c
            .ok_or(Violation::DataUnavailable(TelemetryField::ChipTemperature))?;
        let hashrate_ghs = sample
            .hashrate_ghs
            .ok_or(Violation::DataUnavailable(TelemetryField::HashRate))?;
        let power_w = sample
            .power_w
            .ok_or(Violation::DataUnavailable(TelemetryField::Power))?;

        if chip_temp_c < limits.min_plausible_chip_temp_c {
            return Err(Violation::SensorAnomaly {
                temp_c: chip_temp_c,
                floor_c: limits.min_plausible_chip_temp_c,
            });
        }

        if chip_temp_c >= limits.max_chip_temp_c {
            return Err(Violation::ChipOverTemp {
                temp_c: chip_temp_c,
                max_c: limits.max_chip_temp_c,
            });
        }

        if limits.check_vr_temp {
            if let Some(vr_temp_c) = sample.vr_temp_c {
                if vr_temp_c >= limits.max_vr_temp_c {
                    return Err(Violation::VrOverTemp {
                        temp_c: vr_temp_c,
                        max_c: limits.max_vr_temp_c,
                    });
                }
            }
        }

        if limits.check_input_voltage {
            if let Some(voltage_mv) = sample.input_voltage_mv {
                let range = limits.input_voltage;
                if !(range.min_mv..=range.max_mv).contains(&voltage_mv) {
                    return Err(Violation::InputVoltageOutOfRange {
                        voltage_mv,
                        min_mv: range.min_mv,
                        max_mv: range.max_mv,
                    });
                }
            }
        }

        if power_w > limits.max_power_w {
            return Err(Violation::PowerExceeded {
                power_w,
                max_w: limits.max_power_w,
            });
        }

        Ok(ValidatedSample {
            hashrate_ghs,
            chip_temp_c,
            vr_temp_c: sample.vr_temp_c,
            input_voltage_mv: sample.input_voltage_mv,
            power_w,
        })
    }
}
