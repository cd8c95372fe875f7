//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the sensor front ends and the heater driver and exposes them
//! through [`SampleSource`], [`GasAdc`], [`EnvSource`] and [`HeaterPort`].
//! The service takes one `&mut HardwareAdapter` for all four, so the heater
//! and the ADC never need to be borrowed separately.  On non-espidf targets
//! the sensors read from their simulation stubs.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{EnvSource, GasAdc, HeaterPort, SampleSource};
use crate::drivers::heater::Heater;
use crate::error::{ActuatorError, MeasureError, SensorError};
use crate::ppg::PpgSample;
use crate::sensors::env::EnvSensor;
use crate::sensors::gas_adc::GasAdcChannel;
use crate::sensors::ppg::PpgFrontEnd;
use crate::state::EnvReading;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P> {
    ppg: PpgFrontEnd,
    gas_adc: GasAdcChannel,
    env: EnvSensor,
    heater: Heater<P>,
}

impl<P: OutputPin> HardwareAdapter<P> {
    pub fn new(ppg: PpgFrontEnd, gas_adc: GasAdcChannel, env: EnvSensor, heater: Heater<P>) -> Self {
        Self {
            ppg,
            gas_adc,
            env,
            heater,
        }
    }

    pub fn ppg(&self) -> &PpgFrontEnd {
        &self.ppg
    }

    pub fn gas_adc(&self) -> &GasAdcChannel {
        &self.gas_adc
    }

    /// Force the heater off, ignoring write errors.  Used on the way down.
    pub fn all_off(&mut self) {
        let _ = self.heater.set(false);
    }
}

// ── Sample sources ────────────────────────────────────────────

impl<P: OutputPin> SampleSource for HardwareAdapter<P> {
    fn read_latest(&mut self) -> Result<PpgSample, MeasureError> {
        self.ppg.read()
    }
}

impl<P: OutputPin> GasAdc for HardwareAdapter<P> {
    fn read_raw(&mut self) -> u16 {
        self.gas_adc.read()
    }
}

impl<P: OutputPin> EnvSource for HardwareAdapter<P> {
    fn read_env(&mut self) -> Result<EnvReading, SensorError> {
        self.env.read()
    }
}

// ── Heater ────────────────────────────────────────────────────

impl<P: OutputPin> HeaterPort for HardwareAdapter<P> {
    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.heater.set(on)
    }

    fn heater_on(&self) -> bool {
        self.heater.is_on()
    }
}
