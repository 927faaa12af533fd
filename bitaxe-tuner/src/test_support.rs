//! Shared fixtures for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use time::OffsetDateTime;

use crate::api_client::types::SystemInfo;
use crate::api_client::{ClientError, DeviceClient};
use crate::types::{Measurement, SweepPoint, TelemetrySample};

/// A healthy sample with the given headline values.
pub(crate) fn sample(hashrate_ghs: f64, chip_temp_c: f64, power_w: f64) -> TelemetrySample {
    TelemetrySample {
        timestamp: OffsetDateTime::UNIX_EPOCH,
        hashrate_ghs: Some(hashrate_ghs),
        chip_temp_c: Some(chip_temp_c),
        vr_temp_c: Some(60.0),
        input_voltage_mv: Some(5100.0),
        power_w: Some(power_w),
    }
}

pub(crate) fn measurement(average_hashrate_ghs: f64, efficiency_jth: f64) -> Measurement {
    Measurement {
        average_hashrate_ghs,
        expected_hashrate_ghs: average_hashrate_ghs,
        average_chip_temp_c: 55.0,
        average_vr_temp_c: None,
        average_power_w: average_hashrate_ghs * efficiency_jth / 1000.0,
        efficiency_jth,
        within_tolerance: true,
    }
}

/// Device info with 1000 cores, so expected GH/s equals the frequency.
pub(crate) fn device_info() -> SystemInfo {
    SystemInfo {
        core_voltage: Some(1150.0),
        frequency: Some(500.0),
        small_core_count: Some(1000),
        asic_count: Some(1),
        ..SystemInfo::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ReadInfo,
    ReadTelemetry,
    Apply(SweepPoint),
    Restart,
}

type Responder = Box<dyn Fn(SweepPoint, usize) -> Option<TelemetrySample> + Send + Sync>;

struct State {
    applied: SweepPoint,
    calls: Vec<Call>,
    reads_since_apply: usize,
    /// Remaining successful applies; `None` is unlimited.
    apply_budget: Option<usize>,
}

/// In-memory device whose telemetry is a function of the applied settings.
///
/// The responder receives the applied point and the number of reads since
/// settings were last applied; returning `None` simulates a failed read.
pub(crate) struct ScriptedDevice {
    info: SystemInfo,
    responder: Responder,
    state: Mutex<State>,
}

impl ScriptedDevice {
    pub(crate) fn new() -> Self {
        Self::with_responder(|_, _| Some(sample(1000.0, 55.0, 15.0)))
    }

    pub(crate) fn with_responder(
        responder: impl Fn(SweepPoint, usize) -> Option<TelemetrySample> + Send + Sync + 'static,
    ) -> Self {
        let info = device_info();
        let defaults = info.to_defaults();
        Self {
            info,
            responder: Box::new(responder),
            state: Mutex::new(State {
                applied: defaults.point,
                calls: Vec::new(),
                reads_since_apply: 0,
                apply_budget: None,
            }),
        }
    }

    pub(crate) fn fail_apply_settings(&self) {
        self.fail_apply_after(0);
    }

    /// Let `successes` applies through, then fail every later one.
    pub(crate) fn fail_apply_after(&self, successes: usize) {
        self.state.lock().apply_budget = Some(successes);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn applied_points(&self) -> Vec<SweepPoint> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Apply(point) => Some(point),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, wanted: &Call) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| *call == wanted)
            .count()
    }
}

fn unavailable() -> ClientError {
    ClientError::Status {
        url: "http://scripted/api/system/info".into(),
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[async_trait]
impl DeviceClient for ScriptedDevice {
    async fn read_info(&self) -> Result<SystemInfo, ClientError> {
        self.state.lock().calls.push(Call::ReadInfo);
        Ok(self.info.clone())
    }

    async fn read_telemetry(&self) -> Result<TelemetrySample, ClientError> {
        let (applied, reads) = {
            let mut state = self.state.lock();
            state.calls.push(Call::ReadTelemetry);
            state.reads_since_apply += 1;
            (state.applied, state.reads_since_apply)
        };
        (self.responder)(applied, reads).ok_or_else(unavailable)
    }

    async fn apply_settings(&self, point: SweepPoint) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Apply(point));
        if let Some(budget) = state.apply_budget.as_mut() {
            if *budget == 0 {
                return Err(ClientError::Status {
                    url: "http://scripted/api/system".into(),
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                });
            }
            *budget -= 1;
        }
        state.applied = point;
        state.reads_since_apply = 0;
        Ok(())
    }

    async fn restart(&self) -> Result<(), ClientError> {
        self.state.lock().calls.push(Call::Restart);
        Ok(())
    }
}
