//! One tuning run against one device.
//!
//! [`Tuner::connect`] validates everything it can before touching the
//! device, then reads the device's starting settings. [`Tuner::execute`]
//! drives the sweep and, however the sweep ends, hands the device to
//! [`RecoveryManager`] before returning.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::api_client::DeviceClient;
use crate::config::TunerConfig;
use crate::ranking::{Rankings, rank};
use crate::recovery::{FinalizeOutcome, RecoveryManager};
use crate::results::{BenchmarkReport, ResultStore};
use crate::safety::SafetyMonitor;
use crate::sampler::SampleAggregator;
use crate::sweep::{StopReason, SweepController, SweepState};
use crate::tracing::prelude::*;
use crate::types::{
    BenchmarkResults, DeviceDefaults, FailureReason, IterationMeasurement, SweepPoint,
};

/// How the sweep loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepEnd {
    /// The controller reached a terminal state.
    Completed(StopReason),
    /// A device transition failed outside of sampling, or the sweep
    /// panicked.
    Aborted(String),
}

impl fmt::Display for SweepEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepEnd::Completed(reason) => write!(f, "{reason}"),
            SweepEnd::Aborted(error) => write!(f, "aborted: {error}"),
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub stop: SweepEnd,
    pub restore: FinalizeOutcome,
    pub results: BenchmarkResults,
    pub rankings: Rankings,
    /// Where the report was written, if anything was.
    pub results_path: Option<String>,
}

impl RunReport {
    /// True unless the sweep aborted or the device could not be restored.
    pub fn is_clean(&self) -> bool {
        !matches!(self.stop, SweepEnd::Aborted(_))
            && !matches!(self.restore, FinalizeOutcome::RestoreFailed { .. })
    }
}

pub struct Tuner<D: ?Sized> {
    device: Arc<D>,
    config: TunerConfig,
    monitor: SafetyMonitor,
    defaults: DeviceDefaults,
    controller: SweepController,
    results: BenchmarkResults,
    recovery: RecoveryManager,
    store: Box<dyn ResultStore>,
    shutdown: CancellationToken,
}

impl<D: DeviceClient + ?Sized> Tuner<D> {
    /// Validate the run and read the device's starting settings.
    ///
    /// Fails without any device call if the configuration or `initial` is
    /// invalid. Fails if the device cannot be read; nothing has been
    /// changed on it at that point.
    pub async fn connect(
        device: Arc<D>,
        config: TunerConfig,
        initial: SweepPoint,
        store: Box<dyn ResultStore>,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let controller = SweepController::new(config.sweep.clone(), initial)
            .context("invalid starting point")?;

        let defaults = device
            .read_capability()
            .await
            .context("failed to read device settings")?;
        info!(
            core_mv = defaults.point.core_voltage_mv,
            freq_mhz = defaults.point.frequency_mhz,
            small_cores = defaults.capability.small_core_count,
            asics = defaults.capability.asic_count,
            "Device settings"
        );

        Ok(Self {
            device,
            monitor: SafetyMonitor::new(config.safety.clone()),
            recovery: RecoveryManager::new(defaults.point, config.sweep.settle()),
            defaults,
            controller,
            results: BenchmarkResults::new(),
            store,
            shutdown,
            config,
        })
    }

    /// Run the sweep, restore the device and persist the results.
    pub async fn execute(mut self) -> RunReport {
        // A panic must not skip the restore below
        let stop = match AssertUnwindSafe(self.sweep()).catch_unwind().await {
            Ok(Ok(reason)) => SweepEnd::Completed(reason),
            Ok(Err(e)) => {
                error!(error = format!("{e:#}"), "Unexpected error during benchmark");
                SweepEnd::Aborted(format!("{e:#}"))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "Benchmark panicked");
                SweepEnd::Aborted(format!("panic: {message}"))
            }
        };

        let restore = self
            .recovery
            .finalize(self.device.as_ref(), &self.results)
            .await;

        let rankings = rank(&self.results, self.config.report.top_k);
        let results_path = if self.results.is_empty() {
            warn!("No valid benchmark results to save");
            None
        } else {
            self.persist(&rankings)
        };

        RunReport {
            stop,
            restore,
            results: self.results,
            rankings,
            results_path,
        }
    }

    async fn sweep(&mut self) -> Result<StopReason> {
        loop {
            let point = match self.controller.state() {
                SweepState::Done(reason) => return Ok(reason.clone()),
                SweepState::Probing(point) | SweepState::Backoff(point) => *point,
            };

            let outcome = if self.shutdown.is_cancelled() {
                IterationMeasurement::Failed(FailureReason::Interrupted)
            } else {
                self.probe(point).await?
            };

            if let IterationMeasurement::Measured(m) = &outcome {
                self.results.push(point, m.clone());
                debug!(%point, results = self.results.len(), "Recorded result");
                let rankings = rank(&self.results, self.config.report.top_k);
                self.persist(&rankings);
            }

            self.controller.advance(&outcome);
        }
    }

    /// Apply `point`, restart, wait for the device to settle, then sample.
    async fn probe(&self, point: SweepPoint) -> Result<IterationMeasurement> {
        info!(%point, "Applying settings");
        self.device
            .apply_settings(point)
            .await
            .with_context(|| format!("failed to apply {point}"))?;
        tokio::time::sleep(self.config.sweep.settle()).await;

        self.device
            .restart()
            .await
            .context("failed to restart device")?;
        info!(
            secs = self.config.sweep.stabilization_secs,
            "Waiting for device to stabilize"
        );
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                info!(%point, "Interrupted while stabilizing");
                return Ok(IterationMeasurement::Failed(FailureReason::Interrupted));
            }
            _ = tokio::time::sleep(self.config.sweep.stabilization()) => {}
        }

        let aggregator = SampleAggregator::new(
            self.device.as_ref(),
            &self.monitor,
            &self.config.sampling,
            &self.shutdown,
        );
        Ok(aggregator.run(point, self.defaults.capability).await)
    }

    fn persist(&self, rankings: &Rankings) -> Option<String> {
        let report = BenchmarkReport::new(&self.results, rankings);
        match self.store.save(&report) {
            Ok(()) => {
                debug!(path = %self.store.location(), results = self.results.len(), "Saved results");
                Some(self.store.location())
            }
            Err(e) => {
                error!(path = %self.store.location(), error = %e, "Failed to save results");
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
