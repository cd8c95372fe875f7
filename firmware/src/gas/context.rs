//! Blackboard threaded through every gas phase handler.
//!
//! The monitor writes the clock and any freshly read ADC count before each
//! tick; handlers consume them, write heater commands and results, and
//! never touch hardware themselves.

use crate::config::GasConfig;

use super::calibration::Calibration;

/// Readings collected per acquisition cycle.
pub const GAS_SAMPLE_COUNT: usize = 16;

const _: () = assert!(GAS_SAMPLE_COUNT.is_power_of_two());

/// Right shift that divides the sample sum by [`GAS_SAMPLE_COUNT`].
pub const GAS_AVERAGE_SHIFT: u32 = GAS_SAMPLE_COUNT.trailing_zeros();

/// One completed acquisition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GasReading {
    pub voltage_mv: u16,
    pub concentration_ppm: u16,
    pub timestamp_ms: u32,
}

/// Outputs the handlers request; applied to the heater after each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct GasCommands {
    pub heater_on: bool,
}

pub struct GasContext {
    // -- Timing --
    /// Clock value for the current tick.
    pub now_ms: u32,
    /// When the current cycle started (Idle counts from here).
    pub cycle_start_ms: u32,
    /// When the heater was switched on.
    pub heater_start_ms: u32,
    /// When the last ADC reading was taken in this cycle.
    pub last_sample_ms: Option<u32>,

    // -- Acquisition --
    pub samples: [u16; GAS_SAMPLE_COUNT],
    pub sample_count: usize,
    /// ADC count read by the monitor for this tick, if one was due.
    pub pending_sample: Option<u16>,

    // -- Outputs --
    pub commands: GasCommands,
    /// Set by Computing for exactly one tick.
    pub completed: Option<GasReading>,

    pub config: GasConfig,
    pub calibration: Calibration,

    /// Latched fault bitmask (see `GasFault::mask()`).
    pub fault_flags: u8,
}

impl GasContext {
    pub fn new(config: GasConfig) -> Self {
        Self {
            now_ms: 0,
            cycle_start_ms: 0,
            heater_start_ms: 0,
            last_sample_ms: None,
            samples: [0; GAS_SAMPLE_COUNT],
            sample_count: 0,
            pending_sample: None,
            commands: GasCommands::default(),
            completed: None,
            calibration: Calibration::from_f32(config.slope, config.intercept),
            config,
            fault_flags: 0,
        }
    }

    pub fn has_faults(&self) -> bool {
        self.fault_flags != 0
    }

    pub fn has_fault(&self, fault: crate::error::GasFault) -> bool {
        self.fault_flags & fault.mask() != 0
    }

    /// Time the heater has been on in this cycle.
    pub fn heating_elapsed_ms(&self) -> u32 {
        self.now_ms.wrapping_sub(self.heater_start_ms)
    }

    /// `true` when Sampling still needs a reading at `now_ms`.
    pub fn sample_due(&self) -> bool {
        self.sample_count < GAS_SAMPLE_COUNT
            && self
                .last_sample_ms
                .is_none_or(|t| self.now_ms.wrapping_sub(t) >= self.config.sample_interval_ms)
    }

    /// Drop any partially collected cycle.
    pub fn clear_samples(&mut self) {
        self.samples = [0; GAS_SAMPLE_COUNT];
        self.sample_count = 0;
        self.last_sample_ms = None;
        self.pending_sample = None;
    }

    /// Average count of a full sample set.
    pub fn average_count(&self) -> u32 {
        let sum: u32 = self.samples[..self.sample_count].iter().map(|&s| u32::from(s)).sum();
        sum >> GAS_AVERAGE_SHIFT
    }
}
