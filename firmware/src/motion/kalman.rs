//! Scalar Kalman filter in Q8.
//!
//! ```text
//!   p⁻ = p + Q
//!   k  = p⁻ / (p⁻ + R)
//!   x  = x + k·(z − x)
//!   p  = p⁻ − k·p⁻        (floored at 0)
//! ```

use crate::fixed::Q8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KalmanFilter {
    estimate: Q8,
    covariance: Q8,
    gain: Q8,
    process_noise: Q8,
    measurement_noise: Q8,
}

impl KalmanFilter {
    pub fn new(initial: Q8, covariance: Q8, process_noise: Q8, measurement_noise: Q8) -> Self {
        Self {
            estimate: initial,
            covariance: covariance.max(Q8::ZERO),
            gain: Q8::ZERO,
            process_noise,
            measurement_noise,
        }
    }

    /// Fold one measurement in and return the new estimate.
    pub fn update(&mut self, measurement: Q8) -> Q8 {
        let predicted = self.covariance + self.process_noise;
        // p⁻ + R > 0 whenever R > 0; a zero denominator degrades to "ignore z".
        self.gain = predicted
            .checked_div(predicted + self.measurement_noise)
            .unwrap_or(Q8::ZERO);
        let innovation = measurement - self.estimate;
        self.estimate = self.estimate + self.gain.saturating_mul(innovation);
        self.covariance = (predicted - self.gain.saturating_mul(predicted)).max(Q8::ZERO);
        self.estimate
    }

    /// Replace Q and R; the estimate and covariance carry on.
    pub fn set_noise(&mut self, process_noise: Q8, measurement_noise: Q8) {
        self.process_noise = process_noise;
        self.measurement_noise = measurement_noise;
    }

    pub fn estimate(&self) -> Q8 {
        self.estimate
    }

    pub fn covariance(&self) -> Q8 {
        self.covariance
    }

    pub fn gain(&self) -> Q8 {
        self.gain
    }
}
