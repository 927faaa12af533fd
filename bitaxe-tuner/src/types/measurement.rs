use thiserror::Error;

use super::SweepPoint;
use crate::safety::Violation;

/// Aggregated result of one successful sampling window.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Trimmed mean hashrate in GH/s.
    pub average_hashrate_ghs: f64,
    /// Theoretical hashrate for the frequency under test.
    pub expected_hashrate_ghs: f64,
    /// Chip temperature with warm-up readings trimmed.
    pub average_chip_temp_c: f64,
    pub average_vr_temp_c: Option<f64>,
    pub average_power_w: f64,
    /// Joules per terahash; lower is better.
    pub efficiency_jth: f64,
    pub within_tolerance: bool,
}

/// Why a sampling window did not produce a measurement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureReason {
    #[error(transparent)]
    Safety(#[from] Violation),

    #[error("telemetry unavailable: {0}")]
    TelemetryUnavailable(String),

    #[error("average hashrate is zero")]
    ZeroHashRate,

    #[error("too few samples collected to aggregate")]
    NoData,

    #[error("interrupted")]
    Interrupted,
}

impl FailureReason {
    /// Stable reason code for logs and reports.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::Safety(violation) => violation.code(),
            FailureReason::TelemetryUnavailable(_) => "SYSTEM_INFO_FAILURE",
            FailureReason::ZeroHashRate => "ZERO_HASHRATE",
            FailureReason::NoData => "NO_DATA_COLLECTED",
            FailureReason::Interrupted => "INTERRUPTED",
        }
    }
}

/// Outcome of sampling one sweep point.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationMeasurement {
    Measured(Measurement),
    Failed(FailureReason),
}

/// A successful measurement tagged with the point it was taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkEntry {
    pub point: SweepPoint,
    pub measurement: Measurement,
}

/// Successful measurements in discovery order.
///
/// Append-only: entries are never modified or removed once pushed.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkResults {
    entries: Vec<BenchmarkEntry>,
}

impl BenchmarkResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: SweepPoint, measurement: Measurement) {
        self.entries.push(BenchmarkEntry { point, measurement });
    }

    pub fn entries(&self) -> &[BenchmarkEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the highest average hashrate; the earliest wins a tie.
    pub fn best_by_hashrate(&self) -> Option<&BenchmarkEntry> {
        self.entries.iter().reduce(|best, entry| {
            if entry.measurement.average_hashrate_ghs > best.measurement.average_hashrate_ghs {
                entry
            } else {
                best
            }
        })
    }
}
