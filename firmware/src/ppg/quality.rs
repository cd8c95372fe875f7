//! Signal-quality metrics: amplitude, SNR and inter-channel correlation.
//!
//! Sums run in `i64`, so a full window of full-scale samples cannot
//! overflow.  Divisions truncate toward zero.

use serde::Serialize;

use crate::fixed::{isqrt, isqrt_u64};

/// Quality of the most recent computation cycle.  All zero until the
/// window has filled once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityMetrics {
    /// Standard deviation of the filtered window.
    pub amplitude: u32,
    /// SNR in tenths of a dB, saturated at 255.
    pub snr_x10: u8,
    /// IR/red correlation, 0–100.
    pub correlation: u8,
}

/// Integer mean and variance (`Σx²/n − mean²`, floored at 0).
pub fn mean_variance(signal: &[i16]) -> (i64, i64) {
    let n = signal.len() as i64;
    if n == 0 {
        return (0, 0);
    }
    let (sum, sum_sq) = signal.iter().fold((0i64, 0i64), |(s, sq), &v| {
        let v = i64::from(v);
        (s + v, sq + v * v)
    });
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0);
    (mean, variance)
}

/// Standard deviation as used by the estimators.
pub fn std_dev(variance: i64) -> u32 {
    isqrt(variance.clamp(0, i64::from(u32::MAX)) as u32)
}

/// Heuristic SNR×10 of a filtered window.
///
/// Noise is taken as a tenth of the amplitude (at least 1).  The linear
/// log approximation `87·(ratio − 100)/100` is calibrated against the 20 dB
/// acceptance threshold and must not be altered.
pub fn snr_x10(signal: &[i16]) -> (u8, u32) {
    let (_, variance) = mean_variance(signal);
    let amplitude = std_dev(variance);
    let noise = (amplitude / 10).max(1);
    let ratio = u64::from(amplitude) * 100 / u64::from(noise);
    if ratio <= 100 {
        return (0, amplitude);
    }
    let snr = (87 * (ratio - 100) / 100).min(255);
    (snr as u8, amplitude)
}

/// Correlation of two equally long channels, ×100 and clamped to 0–100.
///
/// Returns 0 when either channel is flat or the variance product is too
/// small for the `√(v₁·v₂ >> 16) << 8` approximation.
pub fn correlation(a: &[i16], b: &[i16]) -> u8 {
    let n = a.len().min(b.len()) as i64;
    if n == 0 {
        return 0;
    }
    let (mut s1, mut s2, mut s12, mut s11, mut s22) = (0i64, 0i64, 0i64, 0i64, 0i64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (i64::from(x), i64::from(y));
        s1 += x;
        s2 += y;
        s12 += x * y;
        s11 += x * x;
        s22 += y * y;
    }
    let m1 = s1 / n;
    let m2 = s2 / n;
    let cov = s12 / n - m1 * m2;
    let var1 = s11 / n - m1 * m1;
    let var2 = s22 / n - m2 * m2;
    if var1 <= 0 || var2 <= 0 {
        return 0;
    }

    let product = (var1 as u64).saturating_mul(var2 as u64);
    let root = isqrt_u64(product >> 16) << 8;
    if root == 0 {
        return 0;
    }
    (cov * 100 / root as i64).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(len: usize, period: usize, amp: i32, dc: i32) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let phase = (i % period) as i32;
                let half = period as i32 / 2;
                let tri = if phase < half { phase } else { period as i32 - phase };
                (dc + amp * (4 * tri - period as i32) / period as i32) as i16
            })
            .collect()
    }

    #[test]
    fn mean_variance_basic() {
        assert_eq!(mean_variance(&[2, 4, 4, 4, 5, 5, 7, 9]), (5, 4));
        assert_eq!(mean_variance(&[]), (0, 0));
        assert_eq!(mean_variance(&[7; 16]), (7, 0));
    }

    #[test]
    fn full_scale_window_does_not_overflow() {
        let s = [i16::MAX; 128];
        let (mean, var) = mean_variance(&s);
        assert_eq!(mean, i64::from(i16::MAX));
        assert_eq!(var, 0);
        let alt: Vec<i16> = (0..128).map(|i| if i % 2 == 0 { i16::MAX } else { i16::MIN }).collect();
        let (_, var) = mean_variance(&alt);
        assert!(var > 1_000_000_000);
        assert_eq!(std_dev(var), 32_767);
    }

    #[test]
    fn flat_signal_has_zero_snr() {
        assert_eq!(snr_x10(&[100; 128]), (0, 0));
    }

    #[test]
    fn snr_small_amplitudes() {
        // amplitude 3 → ratio 300 → 174, amplitude 4 → ratio 400 → 261 → 255
        let three: Vec<i16> = (0..128).map(|i| if i % 2 == 0 { 3 } else { -3 }).collect();
        assert_eq!(snr_x10(&three), (174, 3));
        let four: Vec<i16> = (0..128).map(|i| if i % 2 == 0 { 4 } else { -4 }).collect();
        assert_eq!(snr_x10(&four), (255, 4));
    }

    #[test]
    fn strong_signal_saturates_snr() {
        let s = wave(128, 32, 500, 0);
        assert_eq!(snr_x10(&s).0, 255);
    }

    #[test]
    fn self_correlation_is_full() {
        let s = wave(128, 40, 400, 3000);
        assert_eq!(correlation(&s, &s), 100);
    }

    #[test]
    fn inverted_correlation_clamps_to_zero() {
        let a = wave(128, 40, 400, 0);
        let b: Vec<i16> = a.iter().map(|v| -v).collect();
        assert_eq!(correlation(&a, &b), 0);
    }

    #[test]
    fn flat_channel_has_no_correlation() {
        let a = wave(128, 40, 400, 0);
        assert_eq!(correlation(&a, &[5; 128]), 0);
    }

    #[test]
    fn tiny_variance_product_reads_zero() {
        let a: Vec<i16> = (0..128).map(|i| if i % 2 == 0 { 5 } else { -5 }).collect();
        assert_eq!(correlation(&a, &a), 0);
    }
}
