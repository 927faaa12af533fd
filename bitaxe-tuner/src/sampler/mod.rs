//! Fixed-window telemetry sampling for one sweep point.
//!
//! The aggregator reads telemetry at a fixed interval for a fixed
//! duration, checks every reading against the safety envelope, and reduces
//! the window to one [`Measurement`]. A single unsafe or missing reading
//! ends the window early; nothing collected before it is averaged.

mod config;
pub mod stats;

use tokio_util::sync::CancellationToken;

pub use config::SamplingConfig;

use crate::api_client::DeviceClient;
use crate::safety::{SafetyMonitor, ValidatedSample};
use crate::tracing::prelude::*;
use crate::types::{DeviceCapability, FailureReason, IterationMeasurement, Measurement, SweepPoint};

/// Readings accumulated over one window.
#[derive(Debug, Default)]
struct Window {
    hashrates: Vec<f64>,
    chip_temps: Vec<f64>,
    vr_temps: Vec<f64>,
    powers: Vec<f64>,
}

impl Window {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            hashrates: Vec::with_capacity(capacity),
            chip_temps: Vec::with_capacity(capacity),
            vr_temps: Vec::with_capacity(capacity),
            powers: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, sample: &ValidatedSample) {
        self.hashrates.push(sample.hashrate_ghs);
        self.chip_temps.push(sample.chip_temp_c);
        self.powers.push(sample.power_w);
        // Boards without a VR sensor report 0
        if let Some(vr) = sample.vr_temp_c.filter(|t| *t > 0.0) {
            self.vr_temps.push(vr);
        }
    }
}

pub struct SampleAggregator<'a, D: ?Sized> {
    device: &'a D,
    monitor: &'a SafetyMonitor,
    config: &'a SamplingConfig,
    shutdown: &'a CancellationToken,
}

impl<'a, D: DeviceClient + ?Sized> SampleAggregator<'a, D> {
    pub fn new(
        device: &'a D,
        monitor: &'a SafetyMonitor,
        config: &'a SamplingConfig,
        shutdown: &'a CancellationToken,
    ) -> Self {
        Self {
            device,
            monitor,
            config,
            shutdown,
        }
    }

    /// Sample `point` for one full window and aggregate the result.
    ///
    /// Returns early with a failure on the first safety violation or failed
    /// read, or with [`FailureReason::Interrupted`] if shutdown is
    /// requested mid-window.
    pub async fn run(&self, point: SweepPoint, capability: DeviceCapability) -> IterationMeasurement {
        let total = self.config.total_samples() as usize;
        let expected_ghs = capability.expected_hashrate_ghs(point.frequency_mhz);
        info!(
            %point,
            samples = total,
            interval_secs = self.config.interval_secs,
            expected_ghs = format!("{expected_ghs:.2}"),
            "Starting benchmark"
        );

        let mut window = Window::with_capacity(total);
        for index in 0..total {
            let read = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return interrupted(point, index),
                read = self.device.read_telemetry() => read,
            };

            let raw = match read {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(%point, sample = index + 1, error = %e, "Failed to read telemetry");
                    return IterationMeasurement::Failed(FailureReason::TelemetryUnavailable(
                        e.to_string(),
                    ));
                }
            };

            let sample = match self.monitor.check(&raw, point) {
                Ok(sample) => sample,
                Err(violation) => {
                    warn!(
                        %point,
                        sample = index + 1,
                        code = violation.code(),
                        reason = %violation,
                        "Safety limit reached, abandoning setting"
                    );
                    return IterationMeasurement::Failed(violation.into());
                }
            };

            window.push(&sample);
            info!(
                progress = format!("{}/{}", index + 1, total),
                percent = format!("{:.1}", (index + 1) as f64 * 100.0 / total as f64),
                core_mv = point.core_voltage_mv,
                freq_mhz = point.frequency_mhz,
                hashrate_ghs = format!("{:.0}", sample.hashrate_ghs),
                input_mv = ?sample.input_voltage_mv,
                temp_c = format!("{:.1}", sample.chip_temp_c),
                vr_temp_c = ?sample.vr_temp_c,
                "Sample"
            );

            if index + 1 < total {
                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => return interrupted(point, index + 1),
                    _ = tokio::time::sleep(self.config.interval()) => {}
                }
            }
        }

        let result = aggregate(&window, expected_ghs, self.config);
        match &result {
            IterationMeasurement::Measured(m) => info!(
                %point,
                average_ghs = format!("{:.2}", m.average_hashrate_ghs),
                expected_ghs = format!("{:.2}", m.expected_hashrate_ghs),
                temp_c = format!("{:.2}", m.average_chip_temp_c),
                vr_temp_c = ?m.average_vr_temp_c.map(|t| format!("{t:.2}")),
                efficiency_jth = format!("{:.2}", m.efficiency_jth),
                within_tolerance = m.within_tolerance,
                "Benchmark complete"
            ),
            IterationMeasurement::Failed(reason) => {
                warn!(%point, code = reason.code(), reason = %reason, "Benchmark produced no result")
            }
        }
        result
    }
}

fn interrupted(point: SweepPoint, collected: usize) -> IterationMeasurement {
    info!(%point, collected, "Sampling interrupted");
    IterationMeasurement::Failed(FailureReason::Interrupted)
}

/// Reduce a complete window to a measurement.
fn aggregate(window: &Window, expected_ghs: f64, config: &SamplingConfig) -> IterationMeasurement {
    let hashrate = stats::trimmed_mean(&window.hashrates, config.hashrate_trim, config.hashrate_trim);
    let chip_temp = stats::trimmed_mean(&window.chip_temps, config.temperature_warmup_trim, 0);
    let power = stats::mean(&window.powers);

    let (Some(average_hashrate_ghs), Some(average_chip_temp_c), Some(average_power_w)) =
        (hashrate, chip_temp, power)
    else {
        return IterationMeasurement::Failed(FailureReason::NoData);
    };

    if average_hashrate_ghs <= 0.0 {
        return IterationMeasurement::Failed(FailureReason::ZeroHashRate);
    }

    let average_vr_temp_c = stats::trimmed_mean(&window.vr_temps, config.temperature_warmup_trim, 0);
    let efficiency_jth = average_power_w / (average_hashrate_ghs / 1000.0);

    IterationMeasurement::Measured(Measurement {
        average_hashrate_ghs,
        expected_hashrate_ghs: expected_ghs,
        average_chip_temp_c,
        average_vr_temp_c,
        average_power_w,
        efficiency_jth,
        within_tolerance: stats::within_tolerance(
            average_hashrate_ghs,
            expected_ghs,
            config.tolerance_factor,
        ),
    })
}
