//! Motion-artifact correction for the heart-rate series.
//!
//! Each accepted BPM value passes through a Q8 Kalman filter and then the
//! TSSD outlier suppressor.  The result is the "corrected" rate published
//! next to the raw estimate.

pub mod kalman;
pub mod tssd;

use crate::config::MotionConfig;
use crate::fixed::Q8;

use kalman::KalmanFilter;
use tssd::TssdFilter;

pub struct MotionCorrector {
    kalman: KalmanFilter,
    tssd: TssdFilter,
    last: u8,
}

impl MotionCorrector {
    /// Seeded at `config.initial_bpm`.
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            kalman: KalmanFilter::new(
                Q8::from_int(i32::from(config.initial_bpm)),
                config.initial_covariance,
                config.process_noise,
                config.measurement_noise,
            ),
            tssd: TssdFilter::new(config.tssd_factor),
            last: config.initial_bpm,
        }
    }

    /// Correct one raw BPM reading.
    pub fn correct(&mut self, bpm: u8) -> u8 {
        let smoothed = self.kalman.update(Q8::from_int(i32::from(bpm)));
        let filtered = self.tssd.filter(smoothed);
        self.last = filtered.round_to_int().clamp(0, i32::from(u8::MAX)) as u8;
        self.last
    }

    /// Apply new noise terms and TSSD factor without reseeding.
    pub fn retune(&mut self, config: &MotionConfig) {
        self.kalman.set_noise(config.process_noise, config.measurement_noise);
        self.tssd.set_factor(config.tssd_factor);
    }

    /// Most recent corrected value (the seed before the first reading).
    pub fn last(&self) -> u8 {
        self.last
    }

    pub fn kalman(&self) -> &KalmanFilter {
        &self.kalman
    }

    pub fn tssd(&self) -> &TssdFilter {
        &self.tssd
    }
}
