//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to serial, notify a
//! BLE characteristic, refresh a display.

use crate::error::{SensorError, Status};
use crate::gas::{GasPhase, GasReading};
use crate::state::{EnvReading, PublishedState};
use crate::trend::TrendAssessment;

/// Which estimator a rejection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimator {
    HeartRate,
    Spo2,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started and anchored its schedule.
    Started { at_ms: u32 },

    /// A heart-rate pass succeeded.
    HeartRate {
        bpm: u8,
        corrected_bpm: u8,
        spo2: u8,
        snr_x10: u8,
        correlation: u8,
    },

    /// An estimation pass produced no value.
    MeasurementRejected { estimator: Estimator, status: Status },

    GasPhaseChanged { from: GasPhase, to: GasPhase },

    GasReading(GasReading),

    /// The gas cycle entered `Error` with this fault bitmask.
    GasFault(u8),

    Environment(EnvReading),

    EnvironmentInvalid(SensorError),

    Trend(TrendAssessment),

    /// Periodic snapshot.
    Telemetry(TelemetryData),

    MeasurementReset { at_ms: u32 },

    MeasurementEnded { at_ms: u32 },

    ConfigUpdated,

    /// A command was refused; carries the reason.
    CommandRejected(&'static str),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub uptime_ms: u32,
    pub state: PublishedState,
    /// Time until the next gas heat, 0 while a cycle is running.
    pub next_gas_cycle_ms: u32,
    /// Scheduler overruns summed over all tasks.
    pub overruns: u32,
}
