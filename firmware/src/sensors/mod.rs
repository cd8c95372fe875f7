//! Sensor subsystem.
//!
//! The I2C bus drivers for the optical front end and the temperature /
//! humidity sensor run in their own context (data-ready ISR or bus task)
//! and hand readings over through a [`Mailbox`].  The main loop drains the
//! mailbox through the port traits without ever blocking on the bus:
//!
//! ```text
//!   bus driver ──post()──▶ Mailbox<T> ──take()──▶ PpgFrontEnd / EnvSensor
//!                                                     │
//!                                           HardwareAdapter (ports)
//! ```
//!
//! The SnO2 divider is read directly from ADC1 in the main loop.

pub mod env;
pub mod gas_adc;
pub mod ppg;

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

#[derive(Clone, Copy)]
struct Slot<T: Copy> {
    value: Option<T>,
    /// Posts that replaced a value nobody had taken yet.
    overwritten: u32,
}

/// Single-slot, latest-wins handover between a producer context and the
/// main loop.  `const`-constructible so it can live in a `static`.
pub struct Mailbox<T: Copy> {
    slot: Mutex<CriticalSectionRawMutex, Cell<Slot<T>>>,
}

impl<T: Copy> Mailbox<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                value: None,
                overwritten: 0,
            })),
        }
    }

    /// Store `value`.  Returns `true` if an unread value was replaced.
    pub fn post(&self, value: T) -> bool {
        self.slot.lock(|cell| {
            let mut slot = cell.get();
            let replaced = slot.value.is_some();
            if replaced {
                slot.overwritten = slot.overwritten.saturating_add(1);
            }
            slot.value = Some(value);
            cell.set(slot);
            replaced
        })
    }

    /// Remove and return the pending value, if any.
    pub fn take(&self) -> Option<T> {
        self.slot.lock(|cell| {
            let mut slot = cell.get();
            let value = slot.value.take();
            cell.set(slot);
            value
        })
    }

    pub fn has_pending(&self) -> bool {
        self.slot.lock(|cell| cell.get().value.is_some())
    }

    pub fn overwritten(&self) -> u32 {
        self.slot.lock(|cell| cell.get().overwritten)
    }
}

impl<T: Copy> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_value() {
        let mb: Mailbox<u16> = Mailbox::new();
        assert_eq!(mb.take(), None);
        assert!(!mb.post(7));
        assert!(mb.has_pending());
        assert_eq!(mb.take(), Some(7));
        assert_eq!(mb.take(), None);
    }

    #[test]
    fn latest_post_wins() {
        let mb: Mailbox<u16> = Mailbox::new();
        mb.post(1);
        assert!(mb.post(2));
        assert!(mb.post(3));
        assert_eq!(mb.overwritten(), 2);
        assert_eq!(mb.take(), Some(3));
    }

    #[test]
    fn works_from_a_static() {
        static MB: Mailbox<(i32, i32)> = Mailbox::new();
        MB.post((1, 2));
        assert_eq!(MB.take(), Some((1, 2)));
    }
}
