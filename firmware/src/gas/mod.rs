//! SnO2 gas-sensor acquisition cycle.
//!
//! A function-pointer phase machine drives the heater through
//! heat → settle → sample → compute, once per `cycle_interval`:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  PhaseTable                                                   │
//! │  ┌───────────┬───────────┬──────────┬───────────────────────┐ │
//! │  │ GasPhase  │ on_enter  │ on_exit  │ on_update             │ │
//! │  ├───────────┼───────────┼──────────┼───────────────────────┤ │
//! │  │ Idle      │ fn(ctx)   │    -     │ fn(ctx)->Option<>     │ │
//! │  │ Heating   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<>     │ │
//! │  │ Sampling  │ fn(ctx)   │    -     │ fn(ctx)->Option<>     │ │
//! │  │ Computing │    -      │    -     │ fn(ctx)->Option<>     │ │
//! │  │ Error     │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<>     │ │
//! │  └───────────┴───────────┴──────────┴───────────────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`GasMonitor`] owns the engine and its [`GasContext`].  Each
//! `update(now)` it reads the ADC if Sampling needs a reading, ticks the
//! engine, then applies the requested heater level.  A heater write failure
//! latches a fault and parks the machine in `Error`.

pub mod calibration;
pub mod context;
pub mod phases;

use log::{error, info};

use crate::app::ports::{GasAdc, HeaterPort};
use crate::config::GasConfig;
use crate::error::GasFault;

use calibration::Calibration;
pub use context::{GAS_SAMPLE_COUNT, GasContext, GasReading};

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Must stay in sync with [`phases::build_phase_table`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[repr(u8)]
pub enum GasPhase {
    #[default]
    Idle = 0,
    Heating = 1,
    Sampling = 2,
    Computing = 3,
    Error = 4,
}

impl GasPhase {
    pub const COUNT: usize = 5;

    /// Convert a table index back to a phase.  Out-of-range indices map to
    /// `Error` (and trip a debug assertion).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Heating,
            2 => Self::Sampling,
            3 => Self::Computing,
            4 => Self::Error,
            _ => {
                debug_assert!(false, "invalid gas phase index: {idx}");
                Self::Error
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

pub type PhaseActionFn = fn(&mut GasContext);

/// Returns `Some(next)` to transition, `None` to stay.
pub type PhaseUpdateFn = fn(&mut GasContext) -> Option<GasPhase>;

pub struct PhaseDescriptor {
    pub id: GasPhase,
    pub name: &'static str,
    pub on_enter: Option<PhaseActionFn>,
    pub on_exit: Option<PhaseActionFn>,
    pub on_update: PhaseUpdateFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    table: [PhaseDescriptor; GasPhase::COUNT],
    current: usize,
    /// Clock value when the current phase was entered.
    entered_ms: u32,
}

impl Fsm {
    pub fn new(table: [PhaseDescriptor; GasPhase::COUNT], initial: GasPhase) -> Self {
        Self {
            table,
            current: initial as usize,
            entered_ms: 0,
        }
    }

    /// Run `on_enter` for the initial phase.
    pub fn start(&mut self, ctx: &mut GasContext) {
        info!("GAS FSM starting in phase: {}", self.table[self.current].name);
        self.entered_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Run the current phase's `on_update` and follow any transition it asks for.
    pub fn tick(&mut self, ctx: &mut GasContext) {
        if let Some(next) = (self.table[self.current].on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    /// Jump to `next` regardless of what the current phase wants.
    pub fn force_transition(&mut self, next: GasPhase, ctx: &mut GasContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_phase(&self) -> GasPhase {
        GasPhase::from_index(self.current)
    }

    pub fn ms_in_current_phase(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.entered_ms)
    }

    fn transition(&mut self, next: GasPhase, ctx: &mut GasContext) {
        let next_idx = next as usize;
        info!(
            "GAS FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }
        self.current = next_idx;
        self.entered_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  GasMonitor
// ═══════════════════════════════════════════════════════════════════════════

pub struct GasMonitor {
    fsm: Fsm,
    ctx: GasContext,
    last: Option<GasReading>,
}

impl GasMonitor {
    pub fn new(config: &GasConfig) -> Self {
        Self {
            fsm: Fsm::new(phases::build_phase_table(), GasPhase::Idle),
            ctx: GasContext::new(config.clone()),
            last: None,
        }
    }

    /// Start the first cycle; the heater comes on `cycle_interval` later.
    pub fn start(&mut self, now_ms: u32) {
        self.ctx.now_ms = now_ms;
        self.ctx.cycle_start_ms = now_ms;
        self.fsm.start(&mut self.ctx);
    }

    /// Advance the cycle.  Returns the reading completed on this tick, if any.
    ///
    /// `hw` provides both the ADC and the heater so one adapter can back
    /// them without a double mutable borrow.
    pub fn update(&mut self, now_ms: u32, hw: &mut (impl GasAdc + HeaterPort)) -> Option<GasReading> {
        self.ctx.now_ms = now_ms;
        if self.fsm.current_phase() == GasPhase::Sampling && self.ctx.sample_due() {
            self.ctx.pending_sample = Some(hw.read_raw());
        }

        self.fsm.tick(&mut self.ctx);
        self.apply_heater(hw);

        let reading = self.ctx.completed.take();
        if reading.is_some() {
            self.last = reading;
        }
        reading
    }

    /// Latch `fault`, drop into `Error` and switch the heater off.
    pub fn trip<H: HeaterPort>(&mut self, fault: GasFault, heater: &mut H) {
        self.ctx.fault_flags |= fault.mask();
        error!("GAS: tripped ({fault})");
        self.fsm.force_transition(GasPhase::Error, &mut self.ctx);
        self.apply_heater(heater);
    }

    /// Clear all faults and restart the cycle from Idle at `now_ms`.
    ///
    /// The heater is driven off before returning; a failed write lands
    /// straight back in Error.
    pub fn reset<H: HeaterPort>(&mut self, now_ms: u32, heater: &mut H) {
        self.ctx.now_ms = now_ms;
        self.ctx.fault_flags = 0;
        self.ctx.cycle_start_ms = now_ms;
        self.fsm.force_transition(GasPhase::Idle, &mut self.ctx);
        self.apply_heater(heater);
    }

    /// Replace timing and calibration; an in-flight cycle keeps running
    /// under the new timing.
    pub fn configure(&mut self, config: &GasConfig) {
        self.ctx.calibration = Calibration::from_f32(config.slope, config.intercept);
        self.ctx.config = config.clone();
    }

    pub fn set_calibration(&mut self, slope: f32, intercept: f32) {
        self.ctx.calibration = Calibration::from_f32(slope, intercept);
        info!(
            "GAS: calibration set to slope {} intercept {}",
            self.ctx.calibration.slope(),
            self.ctx.calibration.intercept()
        );
    }

    pub fn calibration(&self) -> Calibration {
        self.ctx.calibration
    }

    pub fn phase(&self) -> GasPhase {
        self.fsm.current_phase()
    }

    /// Heater level the cycle currently requests.
    pub fn heater_on(&self) -> bool {
        self.ctx.commands.heater_on
    }

    /// Time spent in the current phase.
    pub fn ms_in_phase(&self, now_ms: u32) -> u32 {
        self.fsm.ms_in_current_phase(now_ms)
    }

    pub fn faults(&self) -> u8 {
        self.ctx.fault_flags
    }

    pub fn has_fault(&self, fault: GasFault) -> bool {
        self.ctx.has_fault(fault)
    }

    pub fn last_reading(&self) -> Option<GasReading> {
        self.last
    }

    pub fn samples_collected(&self) -> usize {
        self.ctx.sample_count
    }

    /// Heating time left, or 0 outside Heating.
    pub fn heating_remaining_ms(&self, now_ms: u32) -> u32 {
        if self.phase() != GasPhase::Heating {
            return 0;
        }
        let elapsed = now_ms.wrapping_sub(self.ctx.heater_start_ms);
        self.ctx.config.heat_duration_ms.saturating_sub(elapsed)
    }

    /// Time until Idle starts the next heat, or 0 outside Idle.
    pub fn next_cycle_in_ms(&self, now_ms: u32) -> u32 {
        if self.phase() != GasPhase::Idle {
            return 0;
        }
        let elapsed = now_ms.wrapping_sub(self.ctx.cycle_start_ms);
        self.ctx.config.cycle_interval_ms.saturating_sub(elapsed)
    }

    fn apply_heater<H: HeaterPort>(&mut self, heater: &mut H) {
        let want = self.ctx.commands.heater_on;
        if heater.heater_on() == want {
            return;
        }
        if let Err(e) = heater.set_heater(want) {
            self.ctx.fault_flags |= GasFault::from(e).mask();
            if self.phase() != GasPhase::Error {
                error!("GAS: heater write failed ({e})");
                self.fsm.force_transition(GasPhase::Error, &mut self.ctx);
            }
        }
    }
}
