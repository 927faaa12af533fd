use super::SweepPoint;

/// Hashing topology reported by the device at startup.
///
/// Fixed for the process lifetime; used only to derive the theoretical
/// hashrate at a given frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapability {
    pub small_core_count: u32,
    pub asic_count: u32,
}

impl DeviceCapability {
    /// Widened so any pair the device reports fits.
    pub fn total_cores(&self) -> u64 {
        u64::from(self.small_core_count) * u64::from(self.asic_count)
    }

    /// Theoretical hashrate in GH/s at `frequency_mhz`.
    ///
    /// Each small core produces one hash per clock, so MHz x cores / 1000
    /// gives GH/s.
    pub fn expected_hashrate_ghs(&self, frequency_mhz: u32) -> f64 {
        frequency_mhz as f64 * (self.total_cores() as f64 / 1000.0)
    }
}

/// Settings the device was running when the tuner connected.
///
/// This is the restore target when no setting was measured successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDefaults {
    pub point: SweepPoint,
    pub capability: DeviceCapability,
}
