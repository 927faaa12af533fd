use std::fmt;

use super::config::SweepConfig;
use crate::config::ConfigError;
use crate::tracing::prelude::*;
use crate::types::{FailureReason, IterationMeasurement, SweepPoint};

/// Why the sweep ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// A safety, data or stability failure marked the ceiling.
    Failure(FailureReason),
    /// Stable at the highest allowed frequency.
    FrequencyCeiling,
    /// Still short of expected hashrate at the highest allowed voltage.
    VoltageCeiling,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Failure(reason) => write!(f, "{} ({reason})", reason.code()),
            StopReason::FrequencyCeiling => f.write_str("maximum frequency reached"),
            StopReason::VoltageCeiling => {
                f.write_str("maximum voltage reached without recovering hashrate")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SweepState {
    /// Measure this point after a stable result (or at the start).
    Probing(SweepPoint),
    /// Measure this point after retreating a frequency step and adding
    /// voltage.
    Backoff(SweepPoint),
    Done(StopReason),
}

impl SweepState {
    /// Point awaiting measurement, if the sweep is still running.
    pub fn point(&self) -> Option<SweepPoint> {
        match self {
            SweepState::Probing(point) | SweepState::Backoff(point) => Some(*point),
            SweepState::Done(_) => None,
        }
    }
}

/// Search state machine over (core voltage, frequency).
///
/// Every point it proposes lies within the configured bounds.
#[derive(Debug)]
pub struct SweepController {
    config: SweepConfig,
    state: SweepState,
}

impl SweepController {
    /// Start at `initial`, which must lie within the configured bounds.
    pub fn new(config: SweepConfig, initial: SweepPoint) -> Result<Self, ConfigError> {
        config.validate()?;
        config.check_point(initial)?;
        Ok(Self {
            config,
            state: SweepState::Probing(initial),
        })
    }

    pub fn state(&self) -> &SweepState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, SweepState::Done(_))
    }

    /// Decide the next state from the measurement of the current point.
    ///
    /// Has no effect once the sweep is done.
    pub fn advance(&mut self, measurement: &IterationMeasurement) -> &SweepState {
        let Some(point) = self.state.point() else {
            return &self.state;
        };

        let next = self.next_state(point, measurement);
        match &next {
            SweepState::Probing(next_point) => {
                debug!(from = %point, to = %next_point, "Stable, raising frequency");
            }
            SweepState::Backoff(next_point) => {
                info!(
                    from = %point,
                    to = %next_point,
                    "Hashrate below expectation, lowering frequency and raising voltage"
                );
            }
            SweepState::Done(reason) => {
                info!(at = %point, reason = %reason, "Sweep finished");
            }
        }

        self.state = next;
        &self.state
    }

    fn next_state(&self, point: SweepPoint, measurement: &IterationMeasurement) -> SweepState {
        let config = &self.config;
        let m = match measurement {
            IterationMeasurement::Failed(reason) => {
                return SweepState::Done(StopReason::Failure(reason.clone()));
            }
            IterationMeasurement::Measured(m) => m,
        };

        if m.within_tolerance {
            let frequency = point.frequency_mhz.saturating_add(config.frequency_step_mhz);
            if frequency <= config.max_frequency_mhz {
                SweepState::Probing(SweepPoint {
                    frequency_mhz: frequency,
                    ..point
                })
            } else {
                SweepState::Done(StopReason::FrequencyCeiling)
            }
        } else {
            let voltage = point.core_voltage_mv.saturating_add(config.voltage_step_mv);
            if voltage <= config.max_voltage_mv {
                let frequency = point
                    .frequency_mhz
                    .saturating_sub(config.frequency_step_mhz)
                    .max(config.min_frequency_mhz);
                SweepState::Backoff(SweepPoint::new(voltage, frequency))
            } else {
                SweepState::Done(StopReason::VoltageCeiling)
            }
        }
    }
}
