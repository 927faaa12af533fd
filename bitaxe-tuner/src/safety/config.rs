use serde::Deserialize;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputVoltageRange {
    pub min_mv: f64,
    pub max_mv: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafetyLimits {
    /// Readings below this (°C) are treated as a sensor fault rather than
    /// a cold chip.
    pub min_plausible_chip_temp_c: f64,

    /// Chip temperature (°C) at or above which a setting is abandoned.
    pub max_chip_temp_c: f64,

    /// Voltage regulator temperature limit (°C). Only checked when
    /// `check_vr_temp` is set and the device reports the sensor.
    pub max_vr_temp_c: f64,
    pub check_vr_temp: bool,

    /// Acceptable supply voltage. Only checked when `check_input_voltage`
    /// is set and the device reports it.
    pub input_voltage: InputVoltageRange,
    pub check_input_voltage: bool,

    /// Power ceiling (W). The stock barrel jack is rated for 40 W.
    pub max_power_w: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            min_plausible_chip_temp_c: 5.0,
            max_chip_temp_c: 66.0,
            max_vr_temp_c: 86.0,
            check_vr_temp: true,
            input_voltage: InputVoltageRange {
                min_mv: 4800.0,
                max_mv: 5500.0,
            },
            check_input_voltage: true,
            max_power_w: 40.0,
        }
    }
}

impl SafetyLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_plausible_chip_temp_c >= self.max_chip_temp_c {
            return Err(ConfigError::invalid(
                "safety.min_plausible_chip_temp_c",
                format!(
                    "{} must be below max_chip_temp_c {}",
                    self.min_plausible_chip_temp_c, self.max_chip_temp_c
                ),
            ));
        }
        if self.input_voltage.min_mv > self.input_voltage.max_mv {
            return Err(ConfigError::invalid(
                "safety.input_voltage",
                format!(
                    "min_mv {} exceeds max_mv {}",
                    self.input_voltage.min_mv, self.input_voltage.max_mv
                ),
            ));
        }
        if self.max_power_w <= 0.0 {
            return Err(ConfigError::invalid("safety.max_power_w", "must be positive"));
        }
        Ok(())
    }
}
