//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  Each line starts
//! with a fixed tag so a serial capture can be grepped per subsystem.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { at_ms } => {
                info!("START | t={}ms", at_ms);
            }
            AppEvent::HeartRate {
                bpm,
                corrected_bpm,
                spo2,
                snr_x10,
                correlation,
            } => {
                info!(
                    "HEART | bpm={} corrected={} | spo2={}% | snr={}.{}dB corr={}",
                    bpm,
                    corrected_bpm,
                    spo2,
                    snr_x10 / 10,
                    snr_x10 % 10,
                    correlation,
                );
            }
            AppEvent::MeasurementRejected { estimator, status } => {
                info!("HEART | {:?} rejected: {}", estimator, status);
            }
            AppEvent::GasPhaseChanged { from, to } => {
                info!("GAS   | {:?} -> {:?}", from, to);
            }
            AppEvent::GasReading(r) => {
                info!("GAS   | {}mV -> {}ppm @ {}ms", r.voltage_mv, r.concentration_ppm, r.timestamp_ms);
            }
            AppEvent::GasFault(flags) => {
                warn!("GAS   | fault, flags=0b{:08b}", flags);
            }
            AppEvent::Environment(e) => {
                info!("ENV   | T={:.1}\u{00b0}C RH={:.1}%", e.temperature_c, e.humidity_pct);
            }
            AppEvent::EnvironmentInvalid(e) => {
                warn!("ENV   | invalid: {}", e);
            }
            AppEvent::Trend(t) => {
                info!("TREND | {} (score {})", t.level.label(), t.score);
            }
            AppEvent::Telemetry(t) => {
                let s = &t.state;
                info!(
                    "TELEM | up={}s | HR={}/{}bpm SpO2={}% | acetone={}ppm heater={} phase={:?} \
                     faults=0b{:08b} | T={:.1}\u{00b0}C RH={:.1}% | trend={} | next_gas={}s overruns={}",
                    t.uptime_ms / 1000,
                    s.heart.bpm,
                    s.heart.corrected_bpm,
                    s.heart.spo2,
                    s.gas.concentration_ppm,
                    if s.gas.heater_on { "ON" } else { "off" },
                    s.gas.phase,
                    s.gas.faults,
                    s.env.temperature_c,
                    s.env.humidity_pct,
                    s.trend.level.label(),
                    t.next_gas_cycle_ms / 1000,
                    t.overruns,
                );
            }
            AppEvent::MeasurementReset { at_ms } => {
                info!("MEAS  | reset @ {}ms", at_ms);
            }
            AppEvent::MeasurementEnded { at_ms } => {
                info!("MEAS  | ended @ {}ms", at_ms);
            }
            AppEvent::ConfigUpdated => {
                info!("CONFIG | updated");
            }
            AppEvent::CommandRejected(reason) => {
                warn!("CMD   | rejected: {}", reason);
            }
        }
    }
}
