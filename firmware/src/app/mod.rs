//! Application core: pure domain logic, zero I/O.
//!
//! Holds the rules of the monitor: task scheduling, PPG estimation,
//! motion correction, the gas heater cycle and the trend assessment.
//! Hardware is reached only through the **port traits** in [`ports`], so
//! this layer is fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
