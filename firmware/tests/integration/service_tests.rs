//! Integration tests for the MonitorService → estimators → published state
//! pipeline, driven through the port traits with a 10 ms control loop.

use crate::mock_hw::{MockHardware, Rig};

use pulsebreath::app::commands::AppCommand;
use pulsebreath::app::events::{AppEvent, Estimator};
use pulsebreath::config::SystemConfig;
use pulsebreath::error::{Error, SensorError, Status};
use pulsebreath::scheduler::TaskId;
use pulsebreath::state::EnvReading;
use pulsebreath::trend::TrendLevel;

// ── Heart rate ────────────────────────────────────────────────

#[test]
fn heart_rate_published_on_first_compute() {
    let mut rig = Rig::new(MockHardware::new());
    rig.run_until(1_990);
    assert_eq!(rig.app.published().heart.bpm, 0);
    assert!(!rig.app.published().heart.valid);

    rig.run_until(2_000);
    let heart = rig.app.published().heart;
    assert_eq!(heart.bpm, 150);
    assert_eq!(heart.bpm_status, Status::Success);
    assert!(heart.valid);
    assert_eq!(heart.timestamp_ms, 2_000);
    assert!((70..=150).contains(&heart.corrected_bpm), "corrected {}", heart.corrected_bpm);
    assert!(rig.sink.any(|e| matches!(e, AppEvent::HeartRate { bpm: 150, .. })));
}

#[test]
fn heart_rate_is_stable_across_compute_cycles() {
    let mut rig = Rig::new(MockHardware::new());
    rig.run_until(2_000);
    let first_corrected = rig.app.published().heart.corrected_bpm;
    rig.run_until(12_000);
    assert_eq!(rig.app.published().heart.bpm, 150);
    assert!(rig.app.published().heart.corrected_bpm >= first_corrected);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::HeartRate { .. })),
        6,
        "one HeartRate event per compute"
    );
}

#[test]
fn silent_front_end_never_fills_the_window() {
    let mut rig = Rig::new(MockHardware::silent());
    rig.run_until(6_000);
    let heart = rig.app.published().heart;
    assert_eq!(heart.bpm, 0);
    assert_eq!(heart.bpm_status, Status::BufferNotFull);
    assert!(!heart.valid);
    assert!(!rig.sink.any(|e| matches!(e, AppEvent::MeasurementRejected { .. })));
    assert!(!rig.sink.any(|e| matches!(e, AppEvent::HeartRate { .. })));
}

#[test]
fn flat_signal_is_rejected_as_poor() {
    let mut hw = MockHardware::new();
    hw.ppg_amplitude = 0.0;
    let mut rig = Rig::new(hw);
    rig.run_until(2_000);
    assert_eq!(rig.app.published().heart.bpm_status, Status::PoorSignal);
    assert!(rig.sink.any(|e| matches!(
        e,
        AppEvent::MeasurementRejected {
            estimator: Estimator::HeartRate,
            status: Status::PoorSignal,
        }
    )));
}

// ── Environment ───────────────────────────────────────────────

#[test]
fn environment_sampled_and_invalidated() {
    let mut rig = Rig::new(MockHardware::new());
    rig.run_until(2_000);
    let env = rig.app.published().env;
    assert!(env.valid);
    assert_eq!(env.temperature_c, 32.0);

    rig.hw.env = Err(SensorError::NoData);
    rig.run_until(4_000);
    let env = rig.app.published().env;
    assert!(!env.valid);
    assert_eq!(env.temperature_c, 32.0, "last good value is kept");
    assert!(rig.sink.any(|e| *e == AppEvent::EnvironmentInvalid(SensorError::NoData)));
}

#[test]
fn implausible_environment_is_out_of_range() {
    let mut hw = MockHardware::new();
    hw.env = Ok(EnvReading {
        temperature_c: 120.0,
        humidity_pct: 40.0,
    });
    let mut rig = Rig::new(hw);
    rig.run_until(2_000);
    assert!(!rig.app.published().env.valid);
    assert!(rig.sink.any(|e| *e == AppEvent::EnvironmentInvalid(SensorError::OutOfRange)));
}

// ── Telemetry / trend ─────────────────────────────────────────

#[test]
fn telemetry_and_trend_every_forty_seconds() {
    let mut rig = Rig::new(MockHardware::new());
    rig.run_until(39_990);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 0);

    rig.run_until(40_000);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 1);
    // 150 bpm is above the normal band; no gas reading yet.
    let trend = rig.app.published().trend;
    assert_eq!(trend.level, TrendLevel::Elevated);
    assert_eq!(trend.timestamp_ms, 40_000);

    let telem = rig.sink.events.iter().find_map(|e| match e {
        AppEvent::Telemetry(t) => Some(*t),
        _ => None,
    });
    let telem = telem.unwrap();
    assert_eq!(telem.uptime_ms, 40_000);
    assert_eq!(telem.state.heart.bpm, 150);
    assert_eq!(telem.overruns, 0);
}

#[test]
fn ten_ms_loop_keeps_up_with_every_task() {
    let mut rig = Rig::new(MockHardware::silent());
    rig.run_until(10_000);
    for id in TaskId::ALL {
        assert_eq!(rig.app.scheduler().stats(id).overruns, 0, "{}", id.label());
    }
    assert_eq!(rig.app.scheduler().stats(TaskId::PpgSample).fires, 1_000);
    assert_eq!(rig.app.poll_count(), 1_000);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn reset_measurement_restarts_the_window() {
    let mut rig = Rig::new(MockHardware::new());
    rig.run_until(2_500);
    assert_eq!(rig.app.published().heart.bpm, 150);

    rig.command(AppCommand::ResetMeasurement).unwrap();
    let state = rig.app.published();
    assert_eq!(state.heart.bpm, 0);
    assert_eq!(state.window.start_ms, 2_500);
    assert!(state.window.is_open());
    assert!(!rig.app.ppg().buffer().is_filled());

    // 150 fresh samples by the next compute.
    rig.run_until(4_000);
    assert_eq!(rig.app.published().heart.bpm, 150);
}

#[test]
fn end_measurement_is_sticky() {
    let mut rig = Rig::new(MockHardware::silent());
    rig.run_until(1_000);
    rig.command(AppCommand::EndMeasurement).unwrap();
    rig.run_until(3_000);
    rig.command(AppCommand::EndMeasurement).unwrap();
    let window = rig.app.published().window;
    assert_eq!(window.end_ms, Some(1_000));
    assert_eq!(window.duration_ms(9_999), 1_000);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::MeasurementEnded { .. })), 2);
}

#[test]
fn invalid_config_update_is_rejected() {
    let mut rig = Rig::new(MockHardware::silent());
    let mut cfg = SystemConfig::default();
    cfg.ppg.min_peaks = 1;
    let res = rig.command(AppCommand::UpdateConfig(cfg));
    assert!(matches!(res, Err(Error::Config(_))));
    assert!(rig.sink.any(|e| matches!(e, AppEvent::CommandRejected(_))));
    assert_eq!(rig.app.config(), &SystemConfig::default());
}

#[test]
fn config_update_changes_task_periods() {
    let mut rig = Rig::new(MockHardware::new());
    let mut cfg = SystemConfig::default();
    cfg.schedule.ppg_compute_ms = 1_500;
    rig.command(AppCommand::UpdateConfig(cfg)).unwrap();
    assert!(rig.sink.any(|e| *e == AppEvent::ConfigUpdated));
    assert_eq!(rig.app.scheduler().period_ms(TaskId::PpgCompute), 1_500);

    rig.run_until(1_500);
    // 150 samples in the ring: the window is full.
    assert_ne!(rig.app.published().heart.bpm_status, Status::BufferNotFull);
}

#[test]
fn non_finite_calibration_is_rejected() {
    let mut rig = Rig::new(MockHardware::silent());
    let res = rig.command(AppCommand::SetGasCalibration {
        slope: f32::NAN,
        intercept: 0.0,
    });
    assert!(res.is_err());
    assert_eq!(rig.app.config().gas.slope, SystemConfig::default().gas.slope);
}
