//! Cooperative multi-rate scheduler.
//!
//! Every task has a period and a sticky "due" flag.  The main loop calls
//! [`Scheduler::update`] with the current time, then polls each flag,
//! does the work and clears it:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │   Clock::now_ms() ──▶ Scheduler::update(now)                 │
//! │                                                              │
//! │   ┌────────────┬────────────┬──────────┬──────────┬────────┐ │
//! │   │ PpgSample  │ PpgCompute │ GasTick  │ EnvSample│Telemetry│ │
//! │   │   10 ms    │   2 s      │  10 ms   │   2 s    │  40 s   │ │
//! │   └─────┬──────┴─────┬──────┴────┬─────┴────┬─────┴───┬────┘ │
//! │         ▼            ▼           ▼          ▼         ▼      │
//! │   due bitfield  ──▶  is_due(task) → work → clear(task)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A flag is only cleared by its consumer.  If a period elapses while the
//! flag is still pending the fire is recorded as an overrun instead of
//! being lost or counted twice.  All timing uses `wrapping_sub`, so the
//! 49-day wrap of the millisecond clock is harmless.

use log::{info, warn};
use serde::Serialize;

use crate::config::ScheduleConfig;

// ═══════════════════════════════════════════════════════════════
//  Task identity
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TaskId {
    PpgSample = 0,
    PpgCompute = 1,
    GasTick = 2,
    EnvSample = 3,
    Telemetry = 4,
}

impl TaskId {
    pub const COUNT: usize = 5;

    pub const ALL: [TaskId; Self::COUNT] = [
        Self::PpgSample,
        Self::PpgCompute,
        Self::GasTick,
        Self::EnvSample,
        Self::Telemetry,
    ];

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PpgSample => "ppg-sample",
            Self::PpgCompute => "ppg-compute",
            Self::GasTick => "gas-tick",
            Self::EnvSample => "env-sample",
            Self::Telemetry => "telemetry",
        }
    }
}

/// Per-task counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// Elapsed periods, including the ones recorded as overruns.
    pub fires: u32,
    /// Periods that elapsed while the previous fire was still pending.
    pub overruns: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    /// Constructed; `update` is a no-op until [`Scheduler::start`].
    Init,
    Running,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct TaskSlot {
    period_ms: u32,
    last_run_ms: u32,
    enabled: bool,
    stats: TaskStats,
}

impl TaskSlot {
    const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_run_ms: 0,
            enabled: true,
            stats: TaskStats { fires: 0, overruns: 0 },
        }
    }
}

pub struct Scheduler {
    /// Indexed by `TaskId as usize`.
    slots: [TaskSlot; TaskId::COUNT],
    /// Bit `n` set = task `n` is due.
    due: u8,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(config: &ScheduleConfig) -> Self {
        let mut slots = [TaskSlot::new(0); TaskId::COUNT];
        for id in TaskId::ALL {
            slots[id as usize] = TaskSlot::new(Self::period_from(config, id));
        }
        Self {
            slots,
            due: 0,
            state: SchedulerState::Init,
        }
    }

    fn period_from(config: &ScheduleConfig, id: TaskId) -> u32 {
        match id {
            TaskId::PpgSample => config.ppg_sample_ms,
            TaskId::PpgCompute => config.ppg_compute_ms,
            TaskId::GasTick => config.gas_tick_ms,
            TaskId::EnvSample => config.env_sample_ms,
            TaskId::Telemetry => config.telemetry_ms,
        }
    }

    /// Anchor every task at `now_ms` and begin firing.
    pub fn start(&mut self, now_ms: u32) {
        for id in TaskId::ALL {
            let slot = &mut self.slots[id as usize];
            slot.last_run_ms = now_ms;
            info!("Scheduler: '{}' every {} ms", id.label(), slot.period_ms);
        }
        self.due = 0;
        self.state = SchedulerState::Running;
    }

    /// Replace task periods.  Phases and pending flags are kept.
    pub fn configure(&mut self, config: &ScheduleConfig) {
        for id in TaskId::ALL {
            self.slots[id as usize].period_ms = Self::period_from(config, id);
        }
    }

    /// Raise the due flag of every task whose period has elapsed.
    pub fn update(&mut self, now_ms: u32) {
        if self.state != SchedulerState::Running {
            return;
        }

        for id in TaskId::ALL {
            let slot = &mut self.slots[id as usize];
            if !slot.enabled || now_ms.wrapping_sub(slot.last_run_ms) < slot.period_ms {
                continue;
            }

            if self.due & id.bit() != 0 {
                slot.stats.overruns = slot.stats.overruns.saturating_add(1);
                warn!("Scheduler: '{}' overrun ({} total)", id.label(), slot.stats.overruns);
            } else {
                self.due |= id.bit();
            }
            slot.last_run_ms = now_ms;
            slot.stats.fires = slot.stats.fires.saturating_add(1);
        }
    }

    pub fn is_due(&self, id: TaskId) -> bool {
        self.due & id.bit() != 0
    }

    /// Acknowledge a fire.
    pub fn clear(&mut self, id: TaskId) {
        self.due &= !id.bit();
    }

    /// `is_due` + `clear` in one step.
    pub fn take(&mut self, id: TaskId) -> bool {
        let due = self.is_due(id);
        self.clear(id);
        due
    }

    /// Disabling a task also drops its pending flag.
    pub fn set_enabled(&mut self, id: TaskId, enabled: bool) {
        self.slots[id as usize].enabled = enabled;
        if !enabled {
            self.clear(id);
        }
    }

    pub fn is_enabled(&self, id: TaskId) -> bool {
        self.slots[id as usize].enabled
    }

    /// Time until `id` next fires; 0 once the period has elapsed.
    pub fn remaining_ms(&self, id: TaskId, now_ms: u32) -> u32 {
        let slot = &self.slots[id as usize];
        slot.period_ms
            .saturating_sub(now_ms.wrapping_sub(slot.last_run_ms))
    }

    pub fn period_ms(&self, id: TaskId) -> u32 {
        self.slots[id as usize].period_ms
    }

    pub fn stats(&self, id: TaskId) -> TaskStats {
        self.slots[id as usize].stats
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Raw due bitfield.
    pub fn due_mask(&self) -> u8 {
        self.due
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn running_at(now: u32) -> Scheduler {
        let mut s = Scheduler::new(&ScheduleConfig::default());
        s.start(now);
        s
    }

    #[test]
    fn not_due_one_ms_early() {
        let mut s = running_at(0);
        s.update(1_999);
        assert!(!s.is_due(TaskId::PpgCompute));
        s.update(2_000);
        assert!(s.is_due(TaskId::PpgCompute));
        assert_eq!(s.stats(TaskId::PpgCompute).fires, 1);
    }

    #[test]
    fn flag_is_sticky_until_cleared() {
        let mut s = running_at(0);
        s.update(2_000);
        s.update(2_001);
        s.update(2_500);
        assert!(s.is_due(TaskId::PpgCompute));
        assert_eq!(s.stats(TaskId::PpgCompute).fires, 1);

        s.clear(TaskId::PpgCompute);
        assert!(!s.is_due(TaskId::PpgCompute));
        s.update(3_999);
        assert!(!s.is_due(TaskId::PpgCompute));
        s.update(4_000);
        assert!(s.is_due(TaskId::PpgCompute));
    }

    #[test]
    fn pending_period_counts_as_overrun() {
        let mut s = running_at(0);
        s.update(2_000);
        s.update(4_000);
        let st = s.stats(TaskId::PpgCompute);
        assert_eq!(st.fires, 2);
        assert_eq!(st.overruns, 1);
        assert!(s.take(TaskId::PpgCompute));
        assert!(!s.take(TaskId::PpgCompute));
    }

    #[test]
    fn update_before_start_is_noop() {
        let mut s = Scheduler::new(&ScheduleConfig::default());
        assert_eq!(s.state(), SchedulerState::Init);
        s.update(100_000);
        assert_eq!(s.due_mask(), 0);
    }

    #[test]
    fn tasks_are_independent() {
        let mut s = running_at(0);
        s.update(10);
        assert!(s.is_due(TaskId::PpgSample));
        assert!(s.is_due(TaskId::GasTick));
        assert!(!s.is_due(TaskId::EnvSample));
        assert!(!s.is_due(TaskId::Telemetry));

        s.clear(TaskId::PpgSample);
        assert!(s.is_due(TaskId::GasTick));
    }

    #[test]
    fn remaining_counts_down() {
        let mut s = running_at(1_000);
        assert_eq!(s.remaining_ms(TaskId::Telemetry, 1_000), 40_000);
        assert_eq!(s.remaining_ms(TaskId::Telemetry, 31_000), 10_000);
        assert_eq!(s.remaining_ms(TaskId::Telemetry, 99_000), 0);
        s.update(41_000);
        assert_eq!(s.remaining_ms(TaskId::Telemetry, 41_000), 40_000);
    }

    #[test]
    fn survives_clock_wrap() {
        let start = u32::MAX - 5;
        let mut s = running_at(start);
        s.update(start.wrapping_add(9));
        assert!(!s.is_due(TaskId::PpgSample));
        s.update(start.wrapping_add(10));
        assert!(s.is_due(TaskId::PpgSample));
    }

    #[test]
    fn disabled_task_never_fires() {
        let mut s = running_at(0);
        s.update(2_000);
        s.set_enabled(TaskId::EnvSample, false);
        assert!(!s.is_due(TaskId::EnvSample));
        s.update(10_000);
        assert!(!s.is_due(TaskId::EnvSample));

        s.set_enabled(TaskId::EnvSample, true);
        s.update(10_001);
        assert!(s.is_due(TaskId::EnvSample));
    }

    #[test]
    fn configure_changes_period() {
        let mut s = running_at(0);
        let cfg = ScheduleConfig {
            ppg_compute_ms: 500,
            ..ScheduleConfig::default()
        };
        s.configure(&cfg);
        assert_eq!(s.period_ms(TaskId::PpgCompute), 500);
        s.update(500);
        assert!(s.is_due(TaskId::PpgCompute));
    }

    #[test]
    fn labels_are_unique() {
        for a in TaskId::ALL {
            for b in TaskId::ALL {
                if a != b {
                    assert_ne!(a.label(), b.label());
                }
            }
        }
    }
}
