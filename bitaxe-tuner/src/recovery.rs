//! Restores the device to a known-good setting when the run ends.
//!
//! Finalization runs at most once per run. The guard is a compare-exchange
//! on an atomic flag, so a second request, whether sequential or
//! overlapping, returns immediately without touching the device.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::api_client::{ClientError, DeviceClient};
use crate::tracing::prelude::*;
use crate::types::{BenchmarkResults, SweepPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreSource {
    /// Highest-hashrate measurement of this run.
    BestResult,
    /// Settings the device reported at startup.
    DeviceDefaults,
}

impl fmt::Display for RestoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreSource::BestResult => f.write_str("best benchmarked settings"),
            RestoreSource::DeviceDefaults => f.write_str("original device settings"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    Restored {
        point: SweepPoint,
        source: RestoreSource,
    },
    RestoreFailed {
        point: SweepPoint,
        source: RestoreSource,
        error: String,
    },
    /// An earlier call already ran; the device was not touched.
    AlreadyFinalized,
}

#[derive(Debug)]
pub struct RecoveryManager {
    defaults: SweepPoint,
    settle: Duration,
    finalized: AtomicBool,
}

impl RecoveryManager {
    /// `defaults` is the fallback restore point; `settle` is the pause
    /// between writing settings and restarting.
    pub fn new(defaults: SweepPoint, settle: Duration) -> Self {
        Self {
            defaults,
            settle,
            finalized: AtomicBool::new(false),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    /// Best result if there is one, otherwise the startup defaults.
    pub fn restore_target(&self, results: &BenchmarkResults) -> (SweepPoint, RestoreSource) {
        match results.best_by_hashrate() {
            Some(best) => (best.point, RestoreSource::BestResult),
            None => (self.defaults, RestoreSource::DeviceDefaults),
        }
    }

    /// Apply the restore target and restart the device, once.
    pub async fn finalize<D: DeviceClient + ?Sized>(
        &self,
        device: &D,
        results: &BenchmarkResults,
    ) -> FinalizeOutcome {
        if self
            .finalized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Device settings already restored, ignoring");
            return FinalizeOutcome::AlreadyFinalized;
        }

        let (point, source) = self.restore_target(results);
        if source == RestoreSource::DeviceDefaults {
            warn!("No valid benchmark results, applying original device settings");
        }
        info!(%point, %source, "Restoring device settings");

        match self.restore(device, point).await {
            Ok(()) => {
                info!(%point, "Device restored");
                FinalizeOutcome::Restored { point, source }
            }
            Err(e) => {
                error!(%point, error = %e, "Failed to restore device settings");
                FinalizeOutcome::RestoreFailed {
                    point,
                    source,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn restore<D: DeviceClient + ?Sized>(
        &self,
        device: &D,
        point: SweepPoint,
    ) -> Result<(), ClientError> {
        device.apply_settings(point).await?;
        tokio::time::sleep(self.settle).await;
        device.restart().await
    }
}
