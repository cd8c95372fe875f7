//! Fuzz target: SnO2 gas cycle
//!
//! Runs `GasMonitor` with arbitrary tick spacing, ADC counts, heater
//! write failures, trips and resets, verifying:
//! - No panics
//! - After a successful heater write, the heater is on only in `Heating`
//! - Every completed reading is within `0..=max_ppm`
//!
//! cargo fuzz run fuzz_gas_cycle

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsebreath::app::ports::{GasAdc, HeaterPort};
use pulsebreath::config::GasConfig;
use pulsebreath::error::{ActuatorError, GasFault};
use pulsebreath::gas::{GasMonitor, GasPhase};

struct FuzzHw {
    raw: u16,
    on: bool,
    fail: bool,
}

impl GasAdc for FuzzHw {
    fn read_raw(&mut self) -> u16 {
        self.raw
    }
}

impl HeaterPort for FuzzHw {
    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        if self.fail {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.on = on;
        Ok(())
    }

    fn heater_on(&self) -> bool {
        self.on
    }
}

fuzz_target!(|data: &[u8]| {
    let config = GasConfig::default();
    let mut gas = GasMonitor::new(&config);
    let mut hw = FuzzHw { raw: 0, on: false, fail: false };
    let mut now: u32 = 0;
    gas.start(now);

    for chunk in data.chunks_exact(4) {
        now = now.wrapping_add(u32::from(u16::from_le_bytes([chunk[0], chunk[1]])));
        hw.raw = u16::from(chunk[2]) << 4;
        let op = chunk[3];
        hw.fail = op & 0x01 != 0;

        match op >> 5 {
            6 => gas.trip(GasFault::External, &mut hw),
            7 => {
                gas.reset(now, &mut hw);
                if !hw.fail {
                    assert!(!hw.on);
                    assert_eq!(gas.phase(), GasPhase::Idle);
                }
            }
            _ => {
                if let Some(r) = gas.update(now, &mut hw) {
                    assert!(r.concentration_ppm <= config.max_ppm);
                }
                if !hw.fail {
                    assert_eq!(hw.on, gas.phase() == GasPhase::Heating);
                }
            }
        }
    }
});
