use std::fmt;

use serde::{Deserialize, Serialize};

/// One (core voltage, frequency) setting under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SweepPoint {
    pub core_voltage_mv: u32,
    pub frequency_mhz: u32,
}

impl SweepPoint {
    pub const fn new(core_voltage_mv: u32, frequency_mhz: u32) -> Self {
        Self {
            core_voltage_mv,
            frequency_mhz,
        }
    }
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mV @ {}MHz", self.core_voltage_mv, self.frequency_mhz)
    }
}
