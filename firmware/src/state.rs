//! Published measurement snapshot.
//!
//! The control loop is the only writer.  Transport or UI tasks read a
//! copy through [`SharedState`], which guards the record with an
//! `embassy-sync` critical-section mutex so a reader never observes a
//! half-written group.
//!
//! ```text
//!   MonitorService ──publish_*()──▶ PublishedState ──store()──▶ SharedState
//!                                                               │
//!                               BLE / display task ◀──load()────┘
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

use crate::error::Status;
use crate::gas::{GasPhase, GasReading};
use crate::ppg::RateEstimate;
use crate::trend::{TrendAssessment, TrendLevel};

// ───────────────────────────────────────────────────────────────
// Environment reading
// ───────────────────────────────────────────────────────────────

/// Plausible operating range of the temperature / humidity sensor.
pub const TEMP_RANGE_C: (f32, f32) = (-40.0, 85.0);
pub const HUMIDITY_RANGE_PCT: (f32, f32) = (0.0, 100.0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnvReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl EnvReading {
    /// Finite and inside the sensor's rated range.
    pub fn is_plausible(&self) -> bool {
        let (t_lo, t_hi) = TEMP_RANGE_C;
        let (h_lo, h_hi) = HUMIDITY_RANGE_PCT;
        (t_lo..=t_hi).contains(&self.temperature_c) && (h_lo..=h_hi).contains(&self.humidity_pct)
    }
}

// ───────────────────────────────────────────────────────────────
// Groups
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeartGroup {
    pub bpm: u8,
    /// Kalman + TSSD corrected rate.
    pub corrected_bpm: u8,
    pub spo2: u8,
    pub snr_x10: u8,
    pub correlation: u8,
    pub bpm_status: Status,
    pub spo2_status: Status,
    /// At least one of `bpm` / `spo2` holds a measured value.
    pub valid: bool,
    pub timestamp_ms: u32,
}

impl HeartGroup {
    pub const EMPTY: Self = Self {
        bpm: 0,
        corrected_bpm: 0,
        spo2: 0,
        snr_x10: 0,
        correlation: 0,
        bpm_status: Status::BufferNotFull,
        spo2_status: Status::BufferNotFull,
        valid: false,
        timestamp_ms: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasGroup {
    pub voltage_mv: u16,
    pub concentration_ppm: u16,
    pub heater_on: bool,
    pub phase: GasPhase,
    /// Latched fault bitmask, 0 when healthy.
    pub faults: u8,
    pub valid: bool,
    pub timestamp_ms: u32,
}

impl GasGroup {
    pub const EMPTY: Self = Self {
        voltage_mv: 0,
        concentration_ppm: 0,
        heater_on: false,
        phase: GasPhase::Idle,
        faults: 0,
        valid: false,
        timestamp_ms: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvGroup {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub valid: bool,
    pub timestamp_ms: u32,
}

impl EnvGroup {
    pub const EMPTY: Self = Self {
        temperature_c: 0.0,
        humidity_pct: 0.0,
        valid: false,
        timestamp_ms: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendGroup {
    pub level: TrendLevel,
    pub score: u8,
    pub timestamp_ms: u32,
}

impl TrendGroup {
    pub const EMPTY: Self = Self {
        level: TrendLevel::Normal,
        score: 0,
        timestamp_ms: 0,
    };
}

/// Start and (once ended) end of the current measurement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeasurementWindow {
    pub start_ms: u32,
    pub end_ms: Option<u32>,
}

impl MeasurementWindow {
    pub const fn is_open(&self) -> bool {
        self.end_ms.is_none()
    }

    /// Length of the window so far (or in total, once ended).
    pub const fn duration_ms(&self, now_ms: u32) -> u32 {
        match self.end_ms {
            Some(end) => end.wrapping_sub(self.start_ms),
            None => now_ms.wrapping_sub(self.start_ms),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// PublishedState
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PublishedState {
    pub heart: HeartGroup,
    pub gas: GasGroup,
    pub env: EnvGroup,
    pub trend: TrendGroup,
    pub window: MeasurementWindow,
}

impl Default for PublishedState {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl PublishedState {
    pub const EMPTY: Self = Self {
        heart: HeartGroup::EMPTY,
        gas: GasGroup::EMPTY,
        env: EnvGroup::EMPTY,
        trend: TrendGroup::EMPTY,
        window: MeasurementWindow {
            start_ms: 0,
            end_ms: None,
        },
    };

    /// Write the heart group from the latest estimate.  A failed pass only
    /// changes statuses and quality; the last valid rate and SpO2 stay.
    pub fn publish_heart(&mut self, est: &RateEstimate, corrected_bpm: u8, now_ms: u32) {
        self.heart = HeartGroup {
            bpm: est.bpm,
            corrected_bpm,
            spo2: est.spo2,
            snr_x10: est.quality.snr_x10,
            correlation: est.quality.correlation,
            bpm_status: est.bpm_status,
            spo2_status: est.spo2_status,
            valid: est.bpm > 0 || est.spo2 > 0,
            timestamp_ms: now_ms,
        };
    }

    pub fn publish_gas(&mut self, reading: &GasReading) {
        self.gas.voltage_mv = reading.voltage_mv;
        self.gas.concentration_ppm = reading.concentration_ppm;
        self.gas.valid = true;
        self.gas.timestamp_ms = reading.timestamp_ms;
    }

    /// Heater, phase and fault fields; refreshed every gas tick.
    pub fn publish_gas_status(&mut self, phase: GasPhase, heater_on: bool, faults: u8) {
        self.gas.phase = phase;
        self.gas.heater_on = heater_on;
        self.gas.faults = faults;
    }

    pub fn publish_env(&mut self, reading: Option<EnvReading>, now_ms: u32) {
        self.env = match reading {
            Some(r) => EnvGroup {
                temperature_c: r.temperature_c,
                humidity_pct: r.humidity_pct,
                valid: true,
                timestamp_ms: now_ms,
            },
            None => EnvGroup {
                valid: false,
                timestamp_ms: now_ms,
                ..self.env
            },
        };
    }

    pub fn publish_trend(&mut self, assessment: TrendAssessment, now_ms: u32) {
        self.trend = TrendGroup {
            level: assessment.level,
            score: assessment.score,
            timestamp_ms: now_ms,
        };
    }

    /// Clear every measured value and open a new window at `now_ms`.
    /// Heater status survives: the gas cycle keeps running.
    pub fn reset_measurement(&mut self, now_ms: u32) {
        let gas_status = (self.gas.phase, self.gas.heater_on, self.gas.faults);
        *self = Self::EMPTY;
        self.publish_gas_status(gas_status.0, gas_status.1, gas_status.2);
        self.window = MeasurementWindow {
            start_ms: now_ms,
            end_ms: None,
        };
    }

    pub fn end_measurement(&mut self, now_ms: u32) {
        if self.window.end_ms.is_none() {
            self.window.end_ms = Some(now_ms);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SharedState
// ───────────────────────────────────────────────────────────────

/// Cross-context holder of the latest [`PublishedState`].
///
/// `const`-constructible so it can live in a `static`.
pub struct SharedState {
    inner: Mutex<CriticalSectionRawMutex, Cell<PublishedState>>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(PublishedState::EMPTY)),
        }
    }

    /// Copy of the whole record.
    pub fn load(&self) -> PublishedState {
        self.inner.lock(|cell| cell.get())
    }

    pub fn store(&self, state: PublishedState) {
        self.inner.lock(|cell| cell.set(state));
    }

    /// Read-modify-write under one critical section.
    pub fn update<R>(&self, f: impl FnOnce(&mut PublishedState) -> R) -> R {
        self.inner.lock(|cell| {
            let mut state = cell.get();
            let r = f(&mut state);
            cell.set(state);
            r
        })
    }

    pub fn heart_rate(&self) -> u8 {
        self.load().heart.bpm
    }

    pub fn corrected_heart_rate(&self) -> u8 {
        self.load().heart.corrected_bpm
    }

    pub fn spo2(&self) -> u8 {
        self.load().heart.spo2
    }

    pub fn acetone_ppm(&self) -> Option<u16> {
        let gas = self.load().gas;
        gas.valid.then_some(gas.concentration_ppm)
    }

    pub fn trend_level(&self) -> TrendLevel {
        self.load().trend.level
    }
}
