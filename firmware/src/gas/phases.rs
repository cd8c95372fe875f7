//! Phase handlers and table builder.
//!
//! ```text
//!  IDLE ──[cycle_interval elapsed]──▶ HEATING ──[heat_duration]──▶ SAMPLING
//!    ▲                                                                │
//!    │                                                     [16 readings]
//!    │                                                                ▼
//!    └───────────────────[result published]──────────────────── COMPUTING
//!
//!  Any phase ──[heater write / overrun / trip]──▶ ERROR ──[reset()]──▶ IDLE
//! ```

use log::{error, info};

use super::calibration::counts_to_mv;
use super::context::{GAS_SAMPLE_COUNT, GasContext, GasReading};
use super::{GasPhase, PhaseDescriptor};
use crate::error::GasFault;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_phase_table() -> [PhaseDescriptor; GasPhase::COUNT] {
    [
        PhaseDescriptor {
            id: GasPhase::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        PhaseDescriptor {
            id: GasPhase::Heating,
            name: "Heating",
            on_enter: Some(heating_enter),
            on_exit: Some(heating_exit),
            on_update: heating_update,
        },
        PhaseDescriptor {
            id: GasPhase::Sampling,
            name: "Sampling",
            on_enter: Some(sampling_enter),
            on_exit: None,
            on_update: sampling_update,
        },
        PhaseDescriptor {
            id: GasPhase::Computing,
            name: "Computing",
            on_enter: None,
            on_exit: None,
            on_update: computing_update,
        },
        PhaseDescriptor {
            id: GasPhase::Error,
            name: "Error",
            on_enter: Some(error_enter),
            on_exit: Some(error_exit),
            on_update: error_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: waiting for the next cycle
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut GasContext) {
    ctx.commands.heater_on = false;
    ctx.clear_samples();
}

fn idle_update(ctx: &mut GasContext) -> Option<GasPhase> {
    if ctx.has_faults() {
        return Some(GasPhase::Error);
    }
    if ctx.now_ms.wrapping_sub(ctx.cycle_start_ms) >= ctx.config.cycle_interval_ms {
        return Some(GasPhase::Heating);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HEATING: heater on, waiting for the sensor to stabilise
// ═══════════════════════════════════════════════════════════════════════════

fn heating_enter(ctx: &mut GasContext) {
    ctx.commands.heater_on = true;
    ctx.heater_start_ms = ctx.now_ms;
    info!("GAS: heater on for {} ms", ctx.config.heat_duration_ms);
}

fn heating_exit(ctx: &mut GasContext) {
    ctx.commands.heater_on = false;
}

fn heating_update(ctx: &mut GasContext) -> Option<GasPhase> {
    if ctx.has_faults() {
        return Some(GasPhase::Error);
    }

    let elapsed = ctx.heating_elapsed_ms();
    let limit = ctx
        .config
        .heat_duration_ms
        .saturating_add(ctx.config.heater_overrun_limit_ms);
    if elapsed > limit {
        ctx.fault_flags |= GasFault::HeaterOverrun.mask();
        return Some(GasPhase::Error);
    }
    if elapsed >= ctx.config.heat_duration_ms {
        return Some(GasPhase::Sampling);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SAMPLING: heater off, one ADC reading per sample interval
// ═══════════════════════════════════════════════════════════════════════════

fn sampling_enter(ctx: &mut GasContext) {
    ctx.commands.heater_on = false;
    ctx.clear_samples();
}

fn sampling_update(ctx: &mut GasContext) -> Option<GasPhase> {
    if ctx.has_faults() {
        return Some(GasPhase::Error);
    }

    if let Some(raw) = ctx.pending_sample.take() {
        if ctx.sample_count < GAS_SAMPLE_COUNT {
            ctx.samples[ctx.sample_count] = raw;
            ctx.sample_count += 1;
            ctx.last_sample_ms = Some(ctx.now_ms);
        }
    }

    (ctx.sample_count >= GAS_SAMPLE_COUNT).then_some(GasPhase::Computing)
}

// ═══════════════════════════════════════════════════════════════════════════
//  COMPUTING: average, convert, publish
// ═══════════════════════════════════════════════════════════════════════════

fn computing_update(ctx: &mut GasContext) -> Option<GasPhase> {
    if ctx.has_faults() {
        return Some(GasPhase::Error);
    }

    let avg = ctx.average_count();
    let mv = counts_to_mv(avg, ctx.config.vref_mv, ctx.config.adc_full_scale);
    let ppm = ctx.calibration.concentration(mv, ctx.config.max_ppm);
    let reading = GasReading {
        voltage_mv: mv.min(u32::from(u16::MAX)) as u16,
        concentration_ppm: ppm,
        timestamp_ms: ctx.now_ms,
    };
    info!("GAS: avg {avg} counts, {mv} mV, {ppm} ppm");

    ctx.completed = Some(reading);
    ctx.cycle_start_ms = ctx.now_ms;
    Some(GasPhase::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR: heater forced off until reset
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter(ctx: &mut GasContext) {
    ctx.commands.heater_on = false;
    ctx.clear_samples();
    error!("GAS: acquisition halted, fault_flags=0b{:08b}", ctx.fault_flags);
}

fn error_exit(_ctx: &mut GasContext) {
    info!("GAS: reset, resuming acquisition");
}

fn error_update(ctx: &mut GasContext) -> Option<GasPhase> {
    ctx.commands.heater_on = false;
    None
}
