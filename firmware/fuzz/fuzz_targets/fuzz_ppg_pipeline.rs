//! Fuzz target: PPG pipeline
//!
//! Feeds arbitrary red/IR pairs into `PpgEngine` and then the motion
//! corrector, verifying:
//! - No panics or arithmetic overflow under arbitrary 32-bit input
//! - Accepted heart rates lie within the configured band
//! - Accepted SpO2 lies within the configured clamp range
//! - Correlation never exceeds 100
//!
//! cargo fuzz run fuzz_ppg_pipeline

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsebreath::config::{MotionConfig, PpgConfig};
use pulsebreath::motion::MotionCorrector;
use pulsebreath::ppg::{PpgEngine, PpgSample};

fuzz_target!(|data: &[u8]| {
    let config = PpgConfig::default();
    let mut engine: PpgEngine = PpgEngine::new(&config);
    let mut motion = MotionCorrector::new(&MotionConfig::default());

    // 8 bytes per pair; compute after every 64 pairs.
    for (i, chunk) in data.chunks_exact(8).enumerate() {
        let red = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let ir = i32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
        engine.ingest(PpgSample { red, ir });

        if i % 64 == 63 {
            if let Ok(bpm) = engine.calculate_bpm() {
                assert!((config.min_bpm..=config.max_bpm).contains(&bpm));
                let _ = motion.correct(bpm);
            }
            if let Ok(spo2) = engine.calculate_spo2() {
                assert!((config.spo2_min..=config.spo2_max).contains(&spo2));
            }
            assert!(engine.quality().correlation <= 100);
        }
    }
});
