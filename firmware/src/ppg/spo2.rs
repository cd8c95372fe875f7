//! Ratio-of-ratios SpO2 estimate.
//!
//! ```text
//!        AC_red / DC_red
//!   R = ─────────────────        SpO2 = 110 − 25·R
//!        AC_ir  / DC_ir
//! ```
//!
//! DC is the window mean, AC the mean absolute deviation from it.  Ratios
//! are carried ×1000 in integers.  Runs on the raw (unfiltered) channels.

use crate::error::MeasureError;

use super::quality::correlation;

/// Limits applied by [`estimate_spo2`].
#[derive(Debug, Clone, Copy)]
pub struct Spo2Limits {
    pub correlation_threshold: u8,
    pub ratio_min_x1000: u32,
    pub ratio_max_x1000: u32,
    pub spo2_min: u8,
    pub spo2_max: u8,
}

/// Outcome of one SpO2 pass; `correlation` is reported even on rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spo2Estimate {
    pub correlation: u8,
    pub result: Result<u8, MeasureError>,
}

/// Window mean (DC) and mean absolute deviation (AC).
pub fn dc_ac(signal: &[i16]) -> (i64, i64) {
    let n = signal.len() as i64;
    if n == 0 {
        return (0, 0);
    }
    let dc = signal.iter().map(|&v| i64::from(v)).sum::<i64>() / n;
    let ac = signal.iter().map(|&v| (i64::from(v) - dc).abs()).sum::<i64>() / n;
    (dc, ac)
}

pub fn estimate_spo2(ir: &[i16], red: &[i16], limits: &Spo2Limits) -> Spo2Estimate {
    let corr = correlation(ir, red);
    Spo2Estimate {
        correlation: corr,
        result: if corr < limits.correlation_threshold {
            Err(MeasureError::PoorSignal)
        } else {
            ratio_of_ratios(ir, red, limits)
        },
    }
}

fn ratio_of_ratios(ir: &[i16], red: &[i16], limits: &Spo2Limits) -> Result<u8, MeasureError> {
    let (ir_dc, ir_ac) = dc_ac(ir);
    let (red_dc, red_ac) = dc_ac(red);
    // Photodetector counts; a non-positive baseline means no perfusion signal.
    if ir_dc <= 0 || red_dc <= 0 {
        return Err(MeasureError::PoorSignal);
    }

    let red_ratio = red_ac * 1000 / red_dc;
    let ir_ratio = ir_ac * 1000 / ir_dc;
    if ir_ratio == 0 {
        return Err(MeasureError::PoorSignal);
    }

    let r_x1000 = (red_ratio * 1000 / ir_ratio).clamp(
        i64::from(limits.ratio_min_x1000),
        i64::from(limits.ratio_max_x1000),
    );
    let spo2 = (110 - 25 * r_x1000 / 1000).clamp(i64::from(limits.spo2_min), i64::from(limits.spo2_max));
    Ok(spo2 as u8)
}
