//! Tuner configuration.
//!
//! Every limit the tuner enforces is a named value here with one canonical
//! default. A TOML file may override any subset:
//!
//! ```toml
//! [sampling]
//! duration_secs = 300
//! tolerance_factor = 0.92
//!
//! [safety]
//! max_chip_temp_c = 65.0
//! check_input_voltage = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use crate::api_client::DeviceConfig;
pub use crate::sampler::SamplingConfig;
pub use crate::safety::SafetyLimits;
pub use crate::sweep::SweepConfig;

/// Fewest samples per window for which trimmed statistics are meaningful.
pub const MIN_SAMPLES: u64 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(
        "Sampling window yields {samples} samples, at least {required} are required; \
         increase duration_secs or decrease interval_secs"
    )]
    InsufficientSamples { samples: u64, required: u64 },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Initial {parameter} {value} is outside the allowed range {min}..={max}")]
    OutOfBounds {
        parameter: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result file ranking options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Entries kept in each ranking.
    pub top_k: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Complete tuner configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TunerConfig {
    pub sweep: SweepConfig,
    pub sampling: SamplingConfig,
    pub safety: SafetyLimits,
    pub device: DeviceConfig,
    pub report: ReportConfig,
}

impl TunerConfig {
    /// Load overrides from a TOML file on top of the defaults.
    ///
    /// The result is not validated; call [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Check internal consistency before any device interaction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sweep.validate()?;
        self.sampling.validate()?;
        self.safety.validate()?;
        self.device.validate()?;
        if self.report.top_k == 0 {
            return Err(ConfigError::invalid("report.top_k", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        TunerConfig::default().validate().unwrap();
    }

    #[test]
    fn defaults_match_canonical_values() {
        let config = TunerConfig::default();
        assert_eq!(config.sampling.total_samples(), 40);
        assert_eq!(config.sampling.tolerance_factor, 0.94);
        assert_eq!(config.safety.max_chip_temp_c, 66.0);
        assert_eq!(config.sweep.max_voltage_mv, 1400);
        assert_eq!(config.report.top_k, 5);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = TunerConfig::from_toml(
            r#"
            [sampling]
            duration_secs = 300
            tolerance_factor = 0.92

            [safety]
            check_input_voltage = false
            "#,
        )
        .unwrap();

        assert_eq!(config.sampling.duration_secs, 300);
        assert_eq!(config.sampling.interval_secs, 15);
        assert_eq!(config.sampling.tolerance_factor, 0.92);
        assert!(!config.safety.check_input_voltage);
        assert!(config.safety.check_vr_temp);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(TunerConfig::from_toml("[sampling]\nduraton_secs = 10\n").is_err());
    }

    #[test]
    fn short_window_is_rejected() {
        let config = TunerConfig::from_toml(
            r#"
            [sampling]
            duration_secs = 90
            interval_secs = 15
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InsufficientSamples {
                samples: 6,
                required: 7
            })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TunerConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuner.toml");
        std::fs::write(&path, "[report]\ntop_k = 3\n").unwrap();

        let config = TunerConfig::load(&path).unwrap();
        assert_eq!(config.report.top_k, 3);
    }
}
