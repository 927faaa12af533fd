use std::time::Duration;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::types::SweepPoint;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub min_voltage_mv: u32,
    pub max_voltage_mv: u32,
    pub min_frequency_mhz: u32,
    pub max_frequency_mhz: u32,

    /// Core voltage added when hashrate falls short of expectation.
    pub voltage_step_mv: u32,

    /// Frequency added after each stable measurement.
    pub frequency_step_mhz: u32,

    /// Pause between writing settings and requesting a restart (seconds).
    pub settle_secs: u64,

    /// Wait after restart before sampling begins (seconds). Some boards
    /// take over a minute to ramp up to full hashrate.
    pub stabilization_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            min_voltage_mv: 1000,
            max_voltage_mv: 1400,
            min_frequency_mhz: 400,
            max_frequency_mhz: 1200,
            voltage_step_mv: 20,
            frequency_step_mhz: 25,
            settle_secs: 2,
            stabilization_secs: 90,
        }
    }
}

impl SweepConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn stabilization(&self) -> Duration {
        Duration::from_secs(self.stabilization_secs)
    }

    pub fn contains(&self, point: SweepPoint) -> bool {
        (self.min_voltage_mv..=self.max_voltage_mv).contains(&point.core_voltage_mv)
            && (self.min_frequency_mhz..=self.max_frequency_mhz).contains(&point.frequency_mhz)
    }

    /// Reject a starting point outside the configured bounds.
    pub fn check_point(&self, point: SweepPoint) -> Result<(), ConfigError> {
        if !(self.min_voltage_mv..=self.max_voltage_mv).contains(&point.core_voltage_mv) {
            return Err(ConfigError::OutOfBounds {
                parameter: "core voltage (mV)",
                value: point.core_voltage_mv,
                min: self.min_voltage_mv,
                max: self.max_voltage_mv,
            });
        }
        if !(self.min_frequency_mhz..=self.max_frequency_mhz).contains(&point.frequency_mhz) {
            return Err(ConfigError::OutOfBounds {
                parameter: "frequency (MHz)",
                value: point.frequency_mhz,
                min: self.min_frequency_mhz,
                max: self.max_frequency_mhz,
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_voltage_mv > self.max_voltage_mv {
            return Err(ConfigError::invalid(
                "sweep.min_voltage_mv",
                format!(
                    "{} exceeds max_voltage_mv {}",
                    self.min_voltage_mv, self.max_voltage_mv
                ),
            ));
        }
        if self.min_frequency_mhz > self.max_frequency_mhz {
            return Err(ConfigError::invalid(
                "sweep.min_frequency_mhz",
                format!(
                    "{} exceeds max_frequency_mhz {}",
                    self.min_frequency_mhz, self.max_frequency_mhz
                ),
            ));
        }
        if self.voltage_step_mv == 0 {
            return Err(ConfigError::invalid("sweep.voltage_step_mv", "must be positive"));
        }
        if self.frequency_step_mhz == 0 {
            return Err(ConfigError::invalid(
                "sweep.frequency_step_mhz",
                "must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(SweepPoint::new(1000, 400); "lower corner")]
    #[test_case(SweepPoint::new(1400, 1200); "upper corner")]
    #[test_case(SweepPoint::new(1150, 500); "typical")]
    fn accepts_points_within_bounds(point: SweepPoint) {
        let config = SweepConfig::default();
        assert!(config.contains(point));
        config.check_point(point).unwrap();
    }

    #[test_case(SweepPoint::new(1401, 500), "core voltage (mV)"; "voltage too high")]
    #[test_case(SweepPoint::new(999, 500), "core voltage (mV)"; "voltage too low")]
    #[test_case(SweepPoint::new(1150, 1225), "frequency (MHz)"; "frequency too high")]
    #[test_case(SweepPoint::new(1150, 375), "frequency (MHz)"; "frequency too low")]
    fn rejects_points_outside_bounds(point: SweepPoint, expected: &str) {
        let config = SweepConfig::default();
        assert!(!config.contains(point));
        match config.check_point(point) {
            Err(ConfigError::OutOfBounds { parameter, .. }) => assert_eq!(parameter, expected),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inverted_bounds_are_invalid() {
        let config = SweepConfig {
            min_frequency_mhz: 800,
            max_frequency_mhz: 600,
            ..SweepConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
