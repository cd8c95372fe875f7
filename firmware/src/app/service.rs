//! Application service: the hexagonal core.
//!
//! [`MonitorService`] owns the scheduler, the PPG engine, the motion
//! corrector, the gas monitor and the published snapshot.  All I/O flows
//! through port traits injected at call sites, so the whole service runs
//! against mock adapters in tests.
//!
//! ```text
//!   SampleSource ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!   GasAdc       ──▶ │        MonitorService        │
//!   EnvSource    ──▶ │ Scheduler · PPG · Motion ·   │ ──▶ PublishedState
//!   HeaterPort   ◀── │ Gas · Trend                  │
//!                    └─────────────────────────────┘
//! ```
//!
//! One [`poll`](MonitorService::poll) is one pass of the control loop:
//! update the scheduler, then run every task whose flag is due, in
//! table order.

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::error::{Error, GasFault, MeasureError, Result, SensorError};
use crate::gas::{GasMonitor, GasPhase};
use crate::motion::MotionCorrector;
use crate::ppg::PpgEngine;
use crate::scheduler::{Scheduler, TaskId};
use crate::state::PublishedState;
use crate::trend::{self, TrendInputs};

use super::commands::AppCommand;
use super::events::{AppEvent, Estimator, TelemetryData};
use super::ports::{Clock, EnvSource, EventSink, GasAdc, HeaterPort, SampleSource};

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

pub struct MonitorService {
    config: SystemConfig,
    scheduler: Scheduler,
    ppg: PpgEngine,
    motion: MotionCorrector,
    gas: GasMonitor,
    state: PublishedState,
    started_ms: u32,
    polls: u64,
}

impl MonitorService {
    /// Build the service from a validated configuration.
    ///
    /// Does **not** start the schedule; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scheduler: Scheduler::new(&config.schedule),
            ppg: PpgEngine::new(&config.ppg),
            motion: MotionCorrector::new(&config.motion),
            gas: GasMonitor::new(&config.gas),
            state: PublishedState::EMPTY,
            started_ms: 0,
            polls: 0,
            config,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Anchor every task at the current time and open the first
    /// measurement window.
    pub fn start(&mut self, clock: &impl Clock, sink: &mut impl EventSink) {
        let now = clock.now_ms();
        self.started_ms = now;
        self.scheduler.start(now);
        self.gas.start(now);
        self.state.reset_measurement(now);
        self.publish_gas_status();
        sink.emit(&AppEvent::Started { at_ms: now });
        info!("MonitorService started at {now} ms");
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// Run one control-loop pass.  Returns `true` if the published state
    /// changed.
    ///
    /// `hw` satisfies every input and actuator port so a single adapter
    /// can back all of them without a double mutable borrow.
    pub fn poll<H>(&mut self, clock: &impl Clock, hw: &mut H, sink: &mut impl EventSink) -> bool
    where
        H: SampleSource + GasAdc + EnvSource + HeaterPort,
    {
        let now = clock.now_ms();
        self.polls += 1;
        self.scheduler.update(now);
        let before = self.state;

        if self.scheduler.take(TaskId::PpgSample) {
            // ReadFailed here only means no new pair since the last poll.
            let _ = self.ppg.acquire(hw);
        }
        if self.scheduler.take(TaskId::PpgCompute) {
            self.compute_heart(now, sink);
        }
        if self.scheduler.take(TaskId::GasTick) {
            self.tick_gas(now, hw, sink);
        }
        if self.scheduler.take(TaskId::EnvSample) {
            self.sample_env(now, hw, sink);
        }
        if self.scheduler.take(TaskId::Telemetry) {
            self.assess_trend(now, sink);
            sink.emit(&AppEvent::Telemetry(self.build_telemetry(now)));
        }

        self.state != before
    }

    fn compute_heart(&mut self, now: u32, sink: &mut impl EventSink) {
        let bpm = self.ppg.calculate_bpm();
        let spo2 = self.ppg.calculate_spo2();

        if let Ok(raw) = bpm {
            let corrected = self.motion.correct(raw);
            debug!("HR accepted: {raw} bpm, corrected {corrected}");
        }
        let est = *self.ppg.latest();
        let corrected = if est.bpm > 0 { self.motion.last() } else { 0 };
        self.state.publish_heart(&est, corrected, now);

        for (estimator, result) in [(Estimator::HeartRate, bpm), (Estimator::Spo2, spo2)] {
            match result {
                Ok(_) => {}
                Err(MeasureError::BufferNotFull) => {
                    debug!("{estimator:?}: window not filled yet");
                }
                Err(e) => {
                    warn!("{estimator:?} rejected: {e}");
                    sink.emit(&AppEvent::MeasurementRejected {
                        estimator,
                        status: e.into(),
                    });
                }
            }
        }

        if bpm.is_ok() || spo2.is_ok() {
            sink.emit(&AppEvent::HeartRate {
                bpm: est.bpm,
                corrected_bpm: corrected,
                spo2: est.spo2,
                snr_x10: est.quality.snr_x10,
                correlation: est.quality.correlation,
            });
        }
    }

    fn tick_gas(&mut self, now: u32, hw: &mut (impl GasAdc + HeaterPort), sink: &mut impl EventSink) {
        let from = self.gas.phase();
        let faults_before = self.gas.faults();

        if let Some(reading) = self.gas.update(now, hw) {
            self.state.publish_gas(&reading);
            sink.emit(&AppEvent::GasReading(reading));
        }

        let to = self.gas.phase();
        if to != from {
            sink.emit(&AppEvent::GasPhaseChanged { from, to });
        }
        if to == GasPhase::Error && self.gas.faults() != faults_before {
            sink.emit(&AppEvent::GasFault(self.gas.faults()));
        }
        self.publish_gas_status();
    }

    fn sample_env(&mut self, now: u32, hw: &mut impl EnvSource, sink: &mut impl EventSink) {
        let reading = hw.read_env().and_then(|r| {
            if r.is_plausible() {
                Ok(r)
            } else {
                Err(SensorError::OutOfRange)
            }
        });

        match reading {
            Ok(r) => {
                self.state.publish_env(Some(r), now);
                sink.emit(&AppEvent::Environment(r));
            }
            Err(e) => {
                warn!("Environment read failed: {e}");
                self.state.publish_env(None, now);
                sink.emit(&AppEvent::EnvironmentInvalid(e));
            }
        }
    }

    fn assess_trend(&mut self, now: u32, sink: &mut impl EventSink) {
        let inputs = TrendInputs {
            bpm: self.state.heart.bpm,
            spo2: self.state.heart.spo2,
            acetone_ppm: self
                .state
                .gas
                .valid
                .then_some(self.state.gas.concentration_ppm),
            snr_x10: self.ppg.buffer().is_filled().then_some(self.state.heart.snr_x10),
        };
        let assessment = trend::assess(&inputs, &self.config.trend);
        if assessment.level != self.state.trend.level {
            info!("Trend {} -> {}", self.state.trend.level.label(), assessment.level.label());
        }
        self.state.publish_trend(assessment, now);
        sink.emit(&AppEvent::Trend(assessment));
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (BLE, serial, UI).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        clock: &impl Clock,
        hw: &mut impl HeaterPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let now = clock.now_ms();
        let outcome = self.apply_command(cmd, now, hw, sink);
        if let Err(Error::Config(reason)) = outcome {
            warn!("Command rejected: {reason}");
            sink.emit(&AppEvent::CommandRejected(reason));
        }
        outcome
    }

    fn apply_command(
        &mut self,
        cmd: AppCommand,
        now: u32,
        hw: &mut impl HeaterPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            AppCommand::SetGasCalibration { slope, intercept } => {
                if !slope.is_finite() || !intercept.is_finite() {
                    return Err(Error::Config("gas calibration must be finite"));
                }
                self.config.gas.slope = slope;
                self.config.gas.intercept = intercept;
                self.gas.set_calibration(slope, intercept);
            }
            AppCommand::ResetGas => {
                let from = self.gas.phase();
                self.gas.reset(now, hw);
                let to = self.gas.phase();
                if from != to {
                    sink.emit(&AppEvent::GasPhaseChanged { from, to });
                }
                if to == GasPhase::Error {
                    sink.emit(&AppEvent::GasFault(self.gas.faults()));
                }
                self.publish_gas_status();
            }
            AppCommand::TripGas => {
                let from = self.gas.phase();
                self.gas.trip(GasFault::External, hw);
                if from != GasPhase::Error {
                    sink.emit(&AppEvent::GasPhaseChanged {
                        from,
                        to: GasPhase::Error,
                    });
                }
                sink.emit(&AppEvent::GasFault(self.gas.faults()));
                self.publish_gas_status();
            }
            AppCommand::ResetMeasurement => {
                self.ppg.reset();
                self.state.reset_measurement(now);
                sink.emit(&AppEvent::MeasurementReset { at_ms: now });
                info!("Measurement window reset at {now} ms");
            }
            AppCommand::EndMeasurement => {
                self.state.end_measurement(now);
                sink.emit(&AppEvent::MeasurementEnded { at_ms: now });
            }
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate()?;
                self.ppg.configure(&new_config.ppg);
                self.motion.retune(&new_config.motion);
                self.gas.configure(&new_config.gas);
                self.scheduler.configure(&new_config.schedule);
                self.config = new_config;
                sink.emit(&AppEvent::ConfigUpdated);
                info!("Configuration updated at runtime");
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self, now: u32) -> TelemetryData {
        let overruns = TaskId::ALL
            .iter()
            .map(|&id| self.scheduler.stats(id).overruns)
            .fold(0u32, u32::saturating_add);
        TelemetryData {
            uptime_ms: now.wrapping_sub(self.started_ms),
            state: self.state,
            next_gas_cycle_ms: self.gas.next_cycle_in_ms(now),
            overruns,
        }
    }

    pub fn published(&self) -> &PublishedState {
        &self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn gas(&self) -> &GasMonitor {
        &self.gas
    }

    pub fn ppg(&self) -> &PpgEngine {
        &self.ppg
    }

    pub fn motion(&self) -> &MotionCorrector {
        &self.motion
    }

    /// Control-loop passes since construction.
    pub fn poll_count(&self) -> u64 {
        self.polls
    }

    fn publish_gas_status(&mut self) {
        self.state
            .publish_gas_status(self.gas.phase(), self.gas.heater_on(), self.gas.faults());
    }
}
