//! Mock hardware adapter for integration tests.
//!
//! Plays back a synthetic PPG waveform, serves a fixed gas ADC count and a
//! scripted environment reading, and records every heater write so tests
//! can assert on the full command history without touching real GPIO.

use pulsebreath::app::commands::AppCommand;
use pulsebreath::app::events::AppEvent;
use pulsebreath::app::ports::{Clock, EnvSource, EventSink, GasAdc, HeaterPort, SampleSource};
use pulsebreath::app::service::MonitorService;
use pulsebreath::config::SystemConfig;
use pulsebreath::error::{ActuatorError, MeasureError, SensorError};
use pulsebreath::ppg::PpgSample;
use pulsebreath::state::EnvReading;

// ── Clock ─────────────────────────────────────────────────────

pub struct ManualClock(pub u32);

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.0
    }
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    /// Sine period in samples; `None` = optical front end silent.
    pub ppg_period: Option<f64>,
    pub ppg_amplitude: f64,
    pub ppg_index: usize,
    pub gas_raw: u16,
    pub gas_reads: usize,
    pub env: Result<EnvReading, SensorError>,
    pub heater: bool,
    pub heater_writes: Vec<bool>,
    pub fail_heater: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            ppg_period: Some(40.0),
            ppg_amplitude: 300.0,
            ppg_index: 0,
            gas_raw: 2048,
            gas_reads: 0,
            env: Ok(EnvReading {
                temperature_c: 32.0,
                humidity_pct: 45.0,
            }),
            heater: false,
            heater_writes: Vec::new(),
            fail_heater: false,
        }
    }

    pub fn silent() -> Self {
        Self {
            ppg_period: None,
            ..Self::new()
        }
    }

    fn wave(&self, i: usize) -> i32 {
        match self.ppg_period {
            Some(period) => {
                let phase = 2.0 * std::f64::consts::PI * i as f64 / period;
                (self.ppg_amplitude * phase.sin()).round() as i32
            }
            None => 0,
        }
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for MockHardware {
    fn read_latest(&mut self) -> Result<PpgSample, MeasureError> {
        if self.ppg_period.is_none() {
            return Err(MeasureError::ReadFailed);
        }
        let v = self.wave(self.ppg_index);
        self.ppg_index += 1;
        Ok(PpgSample { red: v << 2, ir: v << 2 })
    }
}

impl GasAdc for MockHardware {
    fn read_raw(&mut self) -> u16 {
        self.gas_reads += 1;
        self.gas_raw
    }
}

impl EnvSource for MockHardware {
    fn read_env(&mut self) -> Result<EnvReading, SensorError> {
        self.env
    }
}

impl HeaterPort for MockHardware {
    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        if self.fail_heater {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.heater = on;
        self.heater_writes.push(on);
        Ok(())
    }

    fn heater_on(&self) -> bool {
        self.heater
    }
}

// ── Recording sink ────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn any(&self, pred: impl Fn(&AppEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub const STEP_MS: u32 = 10;

/// Service plus mocks, stepped like the firmware's control loop.
pub struct Rig {
    pub app: MonitorService,
    pub clock: ManualClock,
    pub hw: MockHardware,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(hw: MockHardware) -> Self {
        Self::with_config(SystemConfig::default(), hw)
    }

    pub fn with_config(config: SystemConfig, hw: MockHardware) -> Self {
        let mut app = MonitorService::new(config).unwrap();
        let clock = ManualClock(0);
        let mut sink = RecordingSink::new();
        app.start(&clock, &mut sink);
        Self { app, clock, hw, sink }
    }

    pub fn run_until(&mut self, end_ms: u32) {
        while self.clock.0 < end_ms {
            self.clock.0 += STEP_MS;
            self.app.poll(&self.clock, &mut self.hw, &mut self.sink);
        }
    }

    pub fn command(&mut self, cmd: AppCommand) -> pulsebreath::error::Result<()> {
        self.app.handle_command(cmd, &self.clock, &mut self.hw, &mut self.sink)
    }
}
