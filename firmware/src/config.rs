//! System configuration parameters
//!
//! All tunable parameters for the PulseBreath firmware.  Array sizes (PPG
//! window, moving-average width, peak cap, TSSD window, gas sample count)
//! are compile-time constants in their own modules; everything here can be
//! replaced at runtime through `AppCommand::UpdateConfig`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fixed::Q8;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SystemConfig {
    pub ppg: PpgConfig,
    pub motion: MotionConfig,
    pub gas: GasConfig,
    pub schedule: ScheduleConfig,
    pub trend: TrendConfig,
}

/// Heart-rate / SpO2 estimation limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpgConfig {
    /// Spacing between PPG samples (milliseconds).
    pub sample_interval_ms: u32,
    /// Lowest accepted heart rate (BPM).
    pub min_bpm: u8,
    /// Highest accepted heart rate (BPM).
    pub max_bpm: u8,
    /// Minimum SNR×10 of the filtered window.
    pub snr_threshold_x10: u8,
    /// Minimum number of peaks in the window.
    pub min_peaks: u8,
    /// Minimum IR/red correlation (0–100) before SpO2 is attempted.
    pub correlation_threshold: u8,
    /// SpO2 clamp range (%).
    pub spo2_min: u8,
    pub spo2_max: u8,
    /// Ratio-of-ratios clamp range, ×1000.
    pub ratio_min_x1000: u32,
    pub ratio_max_x1000: u32,
}

impl Default for PpgConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 10, // 100 Hz
            min_bpm: 40,
            max_bpm: 180,
            snr_threshold_x10: 200, // 20 dB
            min_peaks: 3,
            correlation_threshold: 70,
            spo2_min: 70,
            spo2_max: 100,
            ratio_min_x1000: 400,
            ratio_max_x1000: 3400,
        }
    }
}

/// Kalman / TSSD tuning for the motion corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Seed estimate for the Kalman filter (BPM).
    pub initial_bpm: u8,
    /// Process noise Q (Q8).
    pub process_noise: Q8,
    /// Measurement noise R (Q8).
    pub measurement_noise: Q8,
    /// Initial error covariance P (Q8).
    pub initial_covariance: Q8,
    /// TSSD outlier threshold in standard deviations.
    pub tssd_factor: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            initial_bpm: 70,
            process_noise: Q8::from_raw(25),       // ~0.1
            measurement_noise: Q8::from_raw(256),  // 1.0
            initial_covariance: Q8::from_raw(256), // 1.0
            tssd_factor: 3,
        }
    }
}

/// SnO2 heater timing and calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasConfig {
    /// Heater-on time before sampling (milliseconds).
    pub heat_duration_ms: u32,
    /// Start-to-start spacing of acquisition cycles (milliseconds).
    pub cycle_interval_ms: u32,
    /// Spacing between ADC readings while sampling (milliseconds).
    pub sample_interval_ms: u32,
    /// How far past `heat_duration_ms` the heater may stay on before the
    /// cycle is faulted (milliseconds).
    pub heater_overrun_limit_ms: u32,
    /// Calibration slope, ppm per mV.
    pub slope: f32,
    /// Calibration intercept, ppm.
    pub intercept: f32,
    /// ADC reference voltage (millivolts).
    pub vref_mv: u32,
    /// ADC full-scale count (12-bit = 4096).
    pub adc_full_scale: u32,
    /// Upper clamp for the reported concentration (ppm).
    pub max_ppm: u16,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            heat_duration_ms: 8_000,
            cycle_interval_ms: 40_000,
            sample_interval_ms: 10,
            heater_overrun_limit_ms: 2_000,
            slope: 0.5,
            intercept: -100.0,
            vref_mv: 3_300,
            adc_full_scale: 4_096,
            max_ppm: 1_000,
        }
    }
}

/// Periods of the cooperative scheduler's tasks (milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub ppg_sample_ms: u32,
    pub ppg_compute_ms: u32,
    pub gas_tick_ms: u32,
    pub env_sample_ms: u32,
    pub telemetry_ms: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            ppg_sample_ms: 10,
            ppg_compute_ms: 2_000,
            gas_tick_ms: 10,
            env_sample_ms: 2_000,
            telemetry_ms: 40_000,
        }
    }
}

/// Thresholds of the non-diagnostic trend indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    pub bpm_low: u8,
    pub bpm_high: u8,
    pub spo2_low: u8,
    /// Acetone proxy above this counts double (ppm).
    pub acetone_ppm: u16,
    /// SNR×10 below this counts as a weak signal.
    pub snr_low_x10: u8,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            bpm_low: 50,
            bpm_high: 120,
            spo2_low: 95,
            acetone_ppm: 5,
            snr_low_x10: 50,
        }
    }
}

impl SystemConfig {
    /// Reject configurations the estimators cannot run with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.ppg;
        if p.sample_interval_ms == 0 {
            return Err(Error::Config("ppg.sample_interval_ms must be > 0"));
        }
        if p.min_bpm == 0 || p.min_bpm >= p.max_bpm {
            return Err(Error::Config("ppg bpm range is empty"));
        }
        if p.min_peaks < 2 {
            return Err(Error::Config("ppg.min_peaks must be >= 2"));
        }
        if p.correlation_threshold > 100 {
            return Err(Error::Config("ppg.correlation_threshold must be <= 100"));
        }
        if p.spo2_min >= p.spo2_max || p.spo2_max > 100 {
            return Err(Error::Config("ppg spo2 range is invalid"));
        }
        if p.ratio_min_x1000 == 0 || p.ratio_min_x1000 >= p.ratio_max_x1000 {
            return Err(Error::Config("ppg ratio range is invalid"));
        }

        let m = &self.motion;
        if m.measurement_noise.raw() <= 0 || m.process_noise.is_negative() || m.initial_covariance.is_negative() {
            return Err(Error::Config("motion noise terms must be non-negative (R > 0)"));
        }
        if m.tssd_factor == 0 {
            return Err(Error::Config("motion.tssd_factor must be > 0"));
        }

        let g = &self.gas;
        if g.sample_interval_ms == 0 || g.heat_duration_ms == 0 {
            return Err(Error::Config("gas timings must be > 0"));
        }
        if g.heat_duration_ms >= g.cycle_interval_ms {
            return Err(Error::Config("gas.heat_duration_ms must be shorter than the cycle"));
        }
        if g.vref_mv == 0 || g.adc_full_scale == 0 {
            return Err(Error::Config("gas ADC scale must be > 0"));
        }
        if !g.slope.is_finite() || !g.intercept.is_finite() {
            return Err(Error::Config("gas calibration must be finite"));
        }

        let s = &self.schedule;
        if [s.ppg_sample_ms, s.ppg_compute_ms, s.gas_tick_ms, s.env_sample_ms, s.telemetry_ms].contains(&0) {
            return Err(Error::Config("schedule periods must be > 0"));
        }
        if s.gas_tick_ms > g.sample_interval_ms {
            return Err(Error::Config("gas tick slower than the gas sample interval"));
        }
        Ok(())
    }
}
