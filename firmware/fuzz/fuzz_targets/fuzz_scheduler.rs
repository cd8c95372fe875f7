//! Fuzz target: cooperative scheduler
//!
//! Drives `Scheduler::update` with arbitrary time steps (including huge
//! jumps across the u32 wrap) and arbitrary consumer behaviour, verifying:
//! - No panics
//! - A raised flag is always backed by a recorded fire
//! - Overruns never exceed fires
//!
//! cargo fuzz run fuzz_scheduler

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsebreath::config::ScheduleConfig;
use pulsebreath::scheduler::{Scheduler, TaskId};

fuzz_target!(|data: &[u8]| {
    let mut s = Scheduler::new(&ScheduleConfig::default());
    let mut now: u32 = 0;
    s.start(now);

    for chunk in data.chunks_exact(3) {
        let step = u32::from(u16::from_le_bytes([chunk[0], chunk[1]]));
        let consume = chunk[2];
        now = now.wrapping_add(step);
        s.update(now);

        for id in TaskId::ALL {
            if s.is_due(id) {
                assert!(s.stats(id).fires > 0);
            }
            if consume & (1 << (id as u8)) != 0 {
                s.clear(id);
            }
            let st = s.stats(id);
            assert!(st.overruns <= st.fires);
        }
    }
});
