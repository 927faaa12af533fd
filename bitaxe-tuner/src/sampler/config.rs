use std::time::Duration;

use serde::Deserialize;

use crate::config::{ConfigError, MIN_SAMPLES};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// Length of the sampling window per setting (seconds).
    pub duration_secs: u64,

    /// Time between telemetry reads (seconds).
    pub interval_secs: u64,

    /// Hashrate readings dropped from each end before averaging.
    pub hashrate_trim: usize,

    /// Lowest temperature readings dropped as warm-up before averaging.
    pub temperature_warmup_trim: usize,

    /// Fraction of the theoretical hashrate a setting must reach to count
    /// as stable.
    pub tolerance_factor: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            duration_secs: 600,
            interval_secs: 15,
            hashrate_trim: 3,
            temperature_warmup_trim: 6,
            tolerance_factor: 0.94,
        }
    }
}

impl SamplingConfig {
    pub fn total_samples(&self) -> u64 {
        self.duration_secs.checked_div(self.interval_secs).unwrap_or(0)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Reject windows too short for the configured trims.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::invalid(
                "sampling.interval_secs",
                "must be at least 1",
            ));
        }

        let samples = self.total_samples();
        let required = MIN_SAMPLES
            .max(2 * self.hashrate_trim as u64 + 1)
            .max(self.temperature_warmup_trim as u64 + 1);
        if samples < required {
            return Err(ConfigError::InsufficientSamples { samples, required });
        }

        if !(self.tolerance_factor > 0.0 && self.tolerance_factor <= 1.0) {
            return Err(ConfigError::invalid(
                "sampling.tolerance_factor",
                format!("{} is not in (0, 1]", self.tolerance_factor),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(105, 15, 7; "exactly seven")]
    #[test_case(600, 15, 40; "default window")]
    #[test_case(100, 15, 6; "partial interval truncates")]
    fn total_samples(duration_secs: u64, interval_secs: u64, expected: u64) {
        let config = SamplingConfig {
            duration_secs,
            interval_secs,
            ..SamplingConfig::default()
        };
        assert_eq!(config.total_samples(), expected);
    }

    #[test]
    fn seven_samples_is_enough() {
        let config = SamplingConfig {
            duration_secs: 105,
            interval_secs: 15,
            ..SamplingConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn larger_trim_raises_the_minimum() {
        let config = SamplingConfig {
            duration_secs: 150,
            interval_secs: 15,
            hashrate_trim: 5,
            ..SamplingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InsufficientSamples {
                samples: 10,
                required: 11
            })
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = SamplingConfig {
            interval_secs: 0,
            ..SamplingConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test_case(0.0; "zero")]
    #[test_case(1.2; "above one")]
    fn tolerance_out_of_range_is_rejected(factor: f64) {
        let config = SamplingConfig {
            tolerance_factor: factor,
            ..SamplingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
