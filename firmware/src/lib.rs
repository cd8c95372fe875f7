//! PulseBreath firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fixed;
pub mod gas;
pub mod motion;
pub mod ppg;
pub mod scheduler;
pub mod state;
pub mod trend;

pub mod pins;

// Hardware-facing layers; the ESP-IDF paths are cfg-gated inside and the
// host build runs against simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod sensors;
