//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (PPG front end, gas ADC, environment sensor, heater pin,
//! clock, event sinks) implement these traits.  The
//! [`MonitorService`](super::service::MonitorService) consumes them via
//! generics, so the estimators never touch hardware directly.

use crate::error::{ActuatorError, MeasureError, SensorError};
use crate::ppg::PpgSample;
use crate::state::EnvReading;

// ───────────────────────────────────────────────────────────────
// Sample sources (driven adapters: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Paired red/IR readings from the optical front end.
pub trait SampleSource {
    /// Non-blocking: the newest pair, or [`MeasureError::ReadFailed`] when
    /// nothing arrived since the last call.
    fn read_latest(&mut self) -> Result<PpgSample, MeasureError>;
}

/// Raw SnO2 divider voltage as a 12-bit ADC count.
pub trait GasAdc {
    fn read_raw(&mut self) -> u16;
}

/// Temperature / humidity sensor.
pub trait EnvSource {
    fn read_env(&mut self) -> Result<EnvReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// SnO2 heater switch.
pub trait HeaterPort {
    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Level of the last successful write.
    fn heater_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Wraps after ~49 days; every consumer
/// compares with `wrapping_sub`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, BLE
/// characteristic, display).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
