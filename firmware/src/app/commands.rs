//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (BLE, serial,
//! UI) that the [`MonitorService`](super::service::MonitorService)
//! interprets and acts upon.

use crate::config::SystemConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Replace the gas calibration (ppm per mV, ppm offset).
    SetGasCalibration { slope: f32, intercept: f32 },

    /// Clear gas faults and restart the acquisition cycle.
    ResetGas,

    /// Park the gas cycle in `Error` with the heater off.
    TripGas,

    /// Clear published values and open a new measurement window.
    ResetMeasurement,

    /// Close the current measurement window.
    EndMeasurement,

    /// Hot-reload configuration; rejected if it fails validation.
    UpdateConfig(SystemConfig),
}
