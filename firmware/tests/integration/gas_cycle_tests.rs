//! Integration tests for the SnO2 heater cycle as seen through the service:
//! heater writes, ADC reads, published gas group and phase events.

use crate::mock_hw::{MockHardware, Rig};

use pulsebreath::app::commands::AppCommand;
use pulsebreath::app::events::AppEvent;
use pulsebreath::config::SystemConfig;
use pulsebreath::error::GasFault;
use pulsebreath::gas::GasPhase;
use pulsebreath::trend::TrendLevel;

fn phase_changes(rig: &Rig) -> Vec<(GasPhase, GasPhase)> {
    rig.sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::GasPhaseChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[test]
fn default_cycle_heats_samples_and_publishes() {
    let mut rig = Rig::new(MockHardware::silent());

    rig.run_until(39_990);
    assert_eq!(rig.app.published().gas.phase, GasPhase::Idle);
    assert!(!rig.hw.heater);

    rig.run_until(40_000);
    assert!(rig.hw.heater);
    assert_eq!(rig.app.published().gas.phase, GasPhase::Heating);
    assert!(rig.app.published().gas.heater_on);

    rig.run_until(44_000);
    assert_eq!(rig.app.gas().heating_remaining_ms(44_000), 4_000);

    rig.run_until(48_000);
    assert!(!rig.hw.heater, "heater off while sampling");
    assert_eq!(rig.app.published().gas.phase, GasPhase::Sampling);

    rig.run_until(48_170);
    let gas = rig.app.published().gas;
    assert!(gas.valid);
    assert_eq!(gas.voltage_mv, 1_650);
    assert_eq!(gas.concentration_ppm, 725);
    assert_eq!(gas.timestamp_ms, 48_170);
    assert_eq!(gas.phase, GasPhase::Idle);

    assert_eq!(rig.hw.heater_writes, vec![true, false]);
    assert_eq!(rig.hw.gas_reads, 16);
    assert_eq!(
        phase_changes(&rig),
        vec![
            (GasPhase::Idle, GasPhase::Heating),
            (GasPhase::Heating, GasPhase::Sampling),
            (GasPhase::Sampling, GasPhase::Computing),
            (GasPhase::Computing, GasPhase::Idle),
        ]
    );
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::GasReading(_))), 1);
}

#[test]
fn acetone_reading_raises_the_trend() {
    let mut rig = Rig::new(MockHardware::new());
    rig.run_until(80_000);
    // Elevated heart rate (+1) and acetone above threshold (+2).
    let trend = rig.app.published().trend;
    assert_eq!(trend.level, TrendLevel::High);
    assert!(trend.score >= 3);
}

#[test]
fn heater_write_failure_latches_until_reset() {
    let mut hw = MockHardware::silent();
    hw.fail_heater = true;
    let mut rig = Rig::new(hw);

    rig.run_until(40_000);
    assert_eq!(rig.app.published().gas.phase, GasPhase::Error);
    assert_eq!(rig.app.published().gas.faults, GasFault::HeaterWrite.mask());
    assert!(rig.sink.any(|e| *e == AppEvent::GasFault(GasFault::HeaterWrite.mask())));

    rig.run_until(100_000);
    assert_eq!(rig.app.gas().phase(), GasPhase::Error);
    assert_eq!(rig.hw.gas_reads, 0);
    assert!(!rig.app.published().gas.valid);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::GasFault(_))), 1);

    rig.hw.fail_heater = false;
    rig.command(AppCommand::ResetGas).unwrap();
    assert_eq!(rig.app.published().gas.phase, GasPhase::Idle);
    assert_eq!(rig.app.published().gas.faults, 0);
    assert_eq!(phase_changes(&rig).last(), Some(&(GasPhase::Error, GasPhase::Idle)));

    // The cycle restarts from the reset.
    rig.run_until(139_990);
    assert!(!rig.hw.heater);
    rig.run_until(140_000);
    assert!(rig.hw.heater);
}

#[test]
fn trip_while_heating_switches_heater_off() {
    let mut rig = Rig::new(MockHardware::silent());
    rig.run_until(41_000);
    assert!(rig.hw.heater);

    rig.command(AppCommand::TripGas).unwrap();
    assert!(!rig.hw.heater);
    assert_eq!(rig.hw.heater_writes, vec![true, false]);
    assert!(rig.app.gas().has_fault(GasFault::External));
    assert_eq!(rig.app.published().gas.phase, GasPhase::Error);
    assert!(rig.sink.any(|e| *e == AppEvent::GasFault(GasFault::External.mask())));

    rig.run_until(60_000);
    assert_eq!(rig.hw.gas_reads, 0);
}

#[test]
fn reset_while_heating_switches_heater_off_before_next_tick() {
    let mut rig = Rig::new(MockHardware::silent());
    rig.run_until(41_000);
    assert!(rig.hw.heater);

    rig.command(AppCommand::ResetGas).unwrap();
    assert!(!rig.hw.heater);
    assert_eq!(rig.hw.heater_writes, vec![true, false]);
    assert_eq!(rig.app.published().gas.phase, GasPhase::Idle);
    assert_eq!(phase_changes(&rig).last(), Some(&(GasPhase::Heating, GasPhase::Idle)));
    assert!(!rig.sink.any(|e| matches!(e, AppEvent::GasFault(_))));
}

#[test]
fn calibration_command_changes_concentration() {
    let mut rig = Rig::new(MockHardware::silent());
    rig.command(AppCommand::SetGasCalibration {
        slope: 0.25,
        intercept: 0.0,
    })
    .unwrap();
    assert_eq!(rig.app.config().gas.slope, 0.25);

    rig.run_until(48_170);
    assert_eq!(rig.app.published().gas.concentration_ppm, 412);
}

#[test]
fn runtime_config_shortens_the_cycle() {
    let mut rig = Rig::new(MockHardware::silent());
    let mut cfg = SystemConfig::default();
    cfg.gas.cycle_interval_ms = 10_000;
    cfg.gas.heat_duration_ms = 2_000;
    rig.command(AppCommand::UpdateConfig(cfg)).unwrap();

    rig.run_until(10_000);
    assert_eq!(rig.app.gas().phase(), GasPhase::Heating);
    rig.run_until(12_170);
    assert_eq!(rig.app.published().gas.concentration_ppm, 725);
    assert_eq!(rig.app.gas().next_cycle_in_ms(12_170), 10_000);
}

#[test]
fn measurement_reset_keeps_gas_status() {
    let mut rig = Rig::new(MockHardware::silent());
    rig.run_until(41_000);
    rig.command(AppCommand::ResetMeasurement).unwrap();
    let gas = rig.app.published().gas;
    assert_eq!(gas.phase, GasPhase::Heating);
    assert!(gas.heater_on);
    assert!(!gas.valid);
}

#[test]
fn stalled_loop_trips_heater_overrun() {
    let mut rig = Rig::new(MockHardware::silent());
    rig.run_until(40_000);
    assert!(rig.hw.heater);

    // The loop stalls past heat duration + overrun limit.
    rig.clock.0 = 50_010;
    rig.app.poll(&rig.clock, &mut rig.hw, &mut rig.sink);
    assert!(rig.app.gas().has_fault(GasFault::HeaterOverrun));
    assert_eq!(rig.app.published().gas.phase, GasPhase::Error);
    assert!(!rig.hw.heater);
}
