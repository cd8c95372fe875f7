//! Time-shifted sliding-window outlier suppressor.
//!
//! Keeps the last [`TSSD_WINDOW`] inputs.  Once the window is full, an input
//! further than `factor·σ` from the window mean is replaced by that mean.
//! The raw input always enters the window, so a sustained level change
//! passes after a few samples while an isolated spike does not.

use heapless::HistoryBuffer;

use crate::fixed::{Q8, isqrt_u64};

pub const TSSD_WINDOW: usize = 5;

#[derive(Debug, Clone)]
pub struct TssdFilter {
    window: HistoryBuffer<i32, TSSD_WINDOW>,
    factor: u8,
    mean: Q8,
    std_dev: Q8,
}

impl TssdFilter {
    pub fn new(factor: u8) -> Self {
        Self {
            window: HistoryBuffer::new(),
            factor,
            mean: Q8::ZERO,
            std_dev: Q8::ZERO,
        }
    }

    pub fn filter(&mut self, value: Q8) -> Q8 {
        let out = if self.is_primed() {
            self.refresh_stats();
            let deviation = i64::from(value.raw()) - i64::from(self.mean.raw());
            if deviation.abs() > i64::from(self.factor) * i64::from(self.std_dev.raw()) {
                self.mean
            } else {
                value
            }
        } else {
            value
        };
        self.window.write(value.raw());
        out
    }

    fn refresh_stats(&mut self) {
        let n = self.window.len() as i64;
        let mean = self.window.as_slice().iter().map(|&v| i64::from(v)).sum::<i64>() / n;
        let var = self
            .window
            .as_slice()
            .iter()
            .fold(0u64, |acc, &v| {
                let d = (i64::from(v) - mean).unsigned_abs();
                acc.saturating_add(d * d)
            })
            / n as u64;
        self.mean = Q8::from_raw(mean as i32);
        self.std_dev = Q8::from_raw(isqrt_u64(var).min(i32::MAX as u64) as i32);
    }

    /// Outlier threshold in standard deviations.
    pub fn set_factor(&mut self, factor: u8) {
        self.factor = factor;
    }

    /// Window mean as of the last full-window decision.
    pub fn mean(&self) -> Q8 {
        self.mean
    }

    /// Window standard deviation as of the last full-window decision.
    pub fn std_dev(&self) -> Q8 {
        self.std_dev
    }

    pub fn is_primed(&self) -> bool {
        self.window.len() == self.window.capacity()
    }
}
