//! Adaptive-threshold peak detection and rate estimation.

use heapless::Vec;

use crate::error::MeasureError;

use super::filter::SETTLED_EDGE;
use super::quality::{mean_variance, std_dev};

/// Peaks beyond this count are dropped.
pub const MAX_PEAKS: usize = 8;

/// A spacing further than `mean / SPACING_TOLERANCE_DIV` from the mean
/// marks a missed or spurious beat.
pub const SPACING_TOLERANCE_DIV: u32 = 4;

pub type PeakList = Vec<u16, MAX_PEAKS>;

/// Indices of strict local maxima above `mean + std/2`, left to right.
///
/// Only the settled interior `SETTLED_EDGE..len − SETTLED_EDGE` is
/// searched.  Scanning stops at the first qualifying peak past
/// [`MAX_PEAKS`].
pub fn find_peaks(signal: &[i16]) -> PeakList {
    let mut peaks = PeakList::new();
    if signal.len() < 2 * SETTLED_EDGE + 1 {
        return peaks;
    }
    let (mean, variance) = mean_variance(signal);
    let threshold = mean + i64::from(std_dev(variance) / 2);

    for i in SETTLED_EDGE..signal.len() - SETTLED_EDGE {
        let (prev, cur, next) = (signal[i - 1], signal[i], signal[i + 1]);
        if cur > prev && cur > next && i64::from(cur) > threshold && peaks.push(i as u16).is_err() {
            break;
        }
    }
    peaks
}

/// Average peak spacing, in samples.
pub fn mean_interval(peaks: &[u16]) -> Option<u32> {
    if peaks.len() < 2 {
        return None;
    }
    let total: u32 = peaks.windows(2).map(|p| u32::from(p[1] - p[0])).sum();
    Some(total / (peaks.len() as u32 - 1))
}

/// Every spacing within `mean / SPACING_TOLERANCE_DIV` of `mean`.
pub fn spacing_is_regular(peaks: &[u16], mean: u32) -> bool {
    let tolerance = mean / SPACING_TOLERANCE_DIV;
    peaks
        .windows(2)
        .all(|p| u32::from(p[1] - p[0]).abs_diff(mean) <= tolerance)
}

/// Beats per minute from an average spacing.
pub fn rate_from_interval(interval_samples: u32, sample_interval_ms: u32) -> Option<u32> {
    60_000u32.checked_div(interval_samples.checked_mul(sample_interval_ms)?)
}

/// Limits applied by [`estimate_rate`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub min_peaks: u8,
    pub min_bpm: u8,
    pub max_bpm: u8,
    pub sample_interval_ms: u32,
}

/// Peaks → BPM, with the peak-count, spacing and range checks.
pub fn estimate_rate(signal: &[i16], limits: &RateLimits) -> Result<u8, MeasureError> {
    let peaks = find_peaks(signal);
    if peaks.len() < usize::from(limits.min_peaks) {
        return Err(MeasureError::PoorSignal);
    }
    let avg = mean_interval(&peaks).ok_or(MeasureError::PoorSignal)?;
    if !spacing_is_regular(&peaks, avg) {
        return Err(MeasureError::PoorSignal);
    }
    let bpm = rate_from_interval(avg, limits.sample_interval_ms).ok_or(MeasureError::PoorSignal)?;
    if bpm < u32::from(limits.min_bpm) || bpm > u32::from(limits.max_bpm) {
        return Err(MeasureError::OutOfRange);
    }
    Ok(bpm as u8)
}
