//! SnO2 divider ADC channel.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.
//!
//! A failed conversion repeats the last good count so the averaging window
//! is not pulled towards zero by a single bus glitch.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use log::warn;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_GAS_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gas_adc(raw: u16) {
    SIM_GAS_ADC.store(raw.min(4095), Ordering::Relaxed);
}

pub struct GasAdcChannel {
    channel: u32,
    last_raw: u16,
    failures: u32,
}

impl GasAdcChannel {
    pub fn new(channel: u32) -> Self {
        Self {
            channel,
            last_raw: 0,
            failures: 0,
        }
    }

    pub fn read(&mut self) -> u16 {
        match self.read_adc() {
            Some(raw) => {
                self.last_raw = raw;
                raw
            }
            None => {
                self.failures = self.failures.saturating_add(1);
                warn!("Gas ADC: CH{} read failed, repeating {}", self.channel, self.last_raw);
                self.last_raw
            }
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        hw_init::adc1_read(self.channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        Some(SIM_GAS_ADC.load(Ordering::Relaxed))
    }
}
