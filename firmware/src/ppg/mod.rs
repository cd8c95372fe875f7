//! Photoplethysmography pipeline: heart rate and SpO2 from two optical
//! channels.
//!
//! ```text
//!  SampleSource ──▶ SampleBuffer (IR, red)
//!                       │
//!        ┌──────────────┴───────────────┐
//!        ▼ unroll IR into work copy     ▼ raw IR + red
//!   filter::condition              spo2::estimate_spo2
//!        │                              │
//!   quality::snr_x10               quality::correlation
//!        │                              │
//!   peaks::estimate_rate                │
//!        └──────────────┬───────────────┘
//!                       ▼
//!                  RateEstimate
//! ```
//!
//! The filter stages consume the work copy only; the ring keeps the raw
//! samples for the ratio-of-ratios stage and for the next pass.
//!
//! Three evenly spaced peaks must fit in the settled part of the window,
//! so a 128-sample window at 10 ms reports nothing slower than about
//! 103 bpm (`60 000 / (58 × 10 ms)`).  Slower rhythms come back as PoorSignal.

pub mod buffer;
pub mod filter;
pub mod peaks;
pub mod quality;
pub mod spo2;

use serde::Serialize;

use crate::app::ports::SampleSource;
use crate::config::PpgConfig;
use crate::error::{MeasureError, Status};

use buffer::SampleBuffer;
use peaks::RateLimits;
pub use quality::QualityMetrics;
use spo2::Spo2Limits;

/// Samples per analysis window (1.28 s at 100 Hz).
pub const PPG_WINDOW: usize = 128;

/// One paired reading from the optical front end, 18-bit right-aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PpgSample {
    pub red: i32,
    pub ir: i32,
}

/// Latest estimates and the status of the most recent attempt at each.
///
/// `bpm` and `spo2` only change on success; `0` means "never measured".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RateEstimate {
    pub bpm: u8,
    pub spo2: u8,
    pub quality: QualityMetrics,
    pub bpm_status: Status,
    pub spo2_status: Status,
}

/// Owns the sample ring, the filter work areas and the latest estimate.
pub struct PpgEngine<const N: usize = PPG_WINDOW> {
    buffer: SampleBuffer<N>,
    work: [i16; N],
    scratch: [i16; N],
    estimate: RateEstimate,
    snr_threshold_x10: u8,
    rate_limits: RateLimits,
    spo2_limits: Spo2Limits,
}

impl<const N: usize> PpgEngine<N> {
    pub fn new(config: &PpgConfig) -> Self {
        let mut engine = Self {
            buffer: SampleBuffer::new(),
            work: [0; N],
            scratch: [0; N],
            estimate: RateEstimate::default(),
            snr_threshold_x10: 0,
            rate_limits: RateLimits {
                min_peaks: 0,
                min_bpm: 0,
                max_bpm: 0,
                sample_interval_ms: 1,
            },
            spo2_limits: Spo2Limits {
                correlation_threshold: 0,
                ratio_min_x1000: 0,
                ratio_max_x1000: 0,
                spo2_min: 0,
                spo2_max: 0,
            },
        };
        engine.configure(config);
        engine
    }

    /// Apply new limits; buffered samples and estimates are kept.
    pub fn configure(&mut self, config: &PpgConfig) {
        self.snr_threshold_x10 = config.snr_threshold_x10;
        self.rate_limits = RateLimits {
            min_peaks: config.min_peaks,
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
            sample_interval_ms: config.sample_interval_ms,
        };
        self.spo2_limits = Spo2Limits {
            correlation_threshold: config.correlation_threshold,
            ratio_min_x1000: config.ratio_min_x1000,
            ratio_max_x1000: config.ratio_max_x1000,
            spo2_min: config.spo2_min,
            spo2_max: config.spo2_max,
        };
    }

    // ── Acquisition ───────────────────────────────────────────

    /// Pull one reading from `source` into the ring.
    pub fn acquire(&mut self, source: &mut impl SampleSource) -> Result<(), MeasureError> {
        let sample = source.read_latest()?;
        self.ingest(sample);
        Ok(())
    }

    pub fn ingest(&mut self, sample: PpgSample) {
        self.buffer.push_raw(sample.ir, sample.red);
    }

    // ── Estimation ────────────────────────────────────────────

    /// Heart rate from the current window.
    ///
    /// Checks, in order: window filled, SNR, peak count, physiological range.
    pub fn calculate_bpm(&mut self) -> Result<u8, MeasureError> {
        let result = self.bpm_pass();
        if let Ok(bpm) = result {
            self.estimate.bpm = bpm;
        }
        self.estimate.bpm_status = Status::from(&result);
        result
    }

    /// SpO2 from the raw IR and red channels of the current window.
    pub fn calculate_spo2(&mut self) -> Result<u8, MeasureError> {
        let result = if self.buffer.is_filled() {
            let est = spo2::estimate_spo2(self.buffer.primary(), self.buffer.aux(), &self.spo2_limits);
            self.estimate.quality.correlation = est.correlation;
            est.result
        } else {
            Err(MeasureError::BufferNotFull)
        };
        if let Ok(spo2) = result {
            self.estimate.spo2 = spo2;
        }
        self.estimate.spo2_status = Status::from(&result);
        result
    }

    fn bpm_pass(&mut self) -> Result<u8, MeasureError> {
        if !self.buffer.is_filled() {
            return Err(MeasureError::BufferNotFull);
        }
        self.buffer.unroll_primary(&mut self.work);
        filter::condition(&mut self.work, &mut self.scratch);

        let (snr, amplitude) = quality::snr_x10(&self.work);
        self.estimate.quality.snr_x10 = snr;
        self.estimate.quality.amplitude = amplitude;
        if snr < self.snr_threshold_x10 {
            return Err(MeasureError::PoorSignal);
        }
        peaks::estimate_rate(&self.work, &self.rate_limits)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn latest(&self) -> &RateEstimate {
        &self.estimate
    }

    pub fn latest_bpm(&self) -> u8 {
        self.estimate.bpm
    }

    pub fn latest_spo2(&self) -> u8 {
        self.estimate.spo2
    }

    pub fn quality(&self) -> QualityMetrics {
        self.estimate.quality
    }

    pub fn buffer(&self) -> &SampleBuffer<N> {
        &self.buffer
    }

    /// Drop all samples and estimates.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.estimate = RateEstimate::default();
    }
}
