//! SnO2 heater switch.
//!
//! Wraps any `embedded-hal` output pin.  On ESP-IDF that is a `PinDriver`
//! on [`GAS_HEATER_GPIO`](crate::pins::GAS_HEATER_GPIO); host tests pass a
//! mock pin.  The driver remembers the level of the last successful write
//! so a failed write never reports the heater as switched.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::HeaterPort;
use crate::error::ActuatorError;

pub struct Heater<P> {
    pin: P,
    on: bool,
    write_failures: u32,
}

impl<P: OutputPin> Heater<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(pin: P) -> Result<Self, ActuatorError> {
        let mut heater = Self {
            pin,
            on: false,
            write_failures: 0,
        };
        heater.set(false)?;
        Ok(heater)
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        match res {
            Ok(()) => {
                self.on = on;
                Ok(())
            }
            Err(_) => {
                self.write_failures = self.write_failures.saturating_add(1);
                warn!("Heater: GPIO write failed (on={}, {} total)", on, self.write_failures);
                Err(ActuatorError::GpioWriteFailed)
            }
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }
}

impl<P: OutputPin> HeaterPort for Heater<P> {
    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.set(on)
    }

    fn heater_on(&self) -> bool {
        self.on
    }
}
