//! ADC → millivolt → ppm conversion for the SnO2 channel.
//!
//! The linear model `ppm = slope·mV + intercept` runs in Q6.  The default
//! coefficients (0.5 ppm/mV, −100 ppm) are field constants for the acetone
//! proxy and are kept as-is.

use crate::fixed::Q6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    slope: Q6,
    intercept: Q6,
}

impl Calibration {
    /// Convert host-supplied coefficients; fractions below 1/64 truncate
    /// toward zero.
    pub fn from_f32(slope: f32, intercept: f32) -> Self {
        Self {
            slope: Q6::from_f32(slope),
            intercept: Q6::from_f32(intercept),
        }
    }

    pub const fn from_q6(slope: Q6, intercept: Q6) -> Self {
        Self { slope, intercept }
    }

    pub fn slope(&self) -> Q6 {
        self.slope
    }

    pub fn intercept(&self) -> Q6 {
        self.intercept
    }

    /// Concentration for a voltage, clamped to `0..=max_ppm`.
    pub fn concentration(&self, voltage_mv: u32, max_ppm: u16) -> u16 {
        let mv = voltage_mv.min(i32::MAX as u32) as i32;
        let ppm = self.slope.scale(mv) + self.intercept;
        ppm.to_int().clamp(0, i32::from(max_ppm)) as u16
    }
}

/// Averaged ADC count → millivolts.
pub fn counts_to_mv(counts: u32, vref_mv: u32, full_scale: u32) -> u32 {
    if full_scale == 0 {
        return 0;
    }
    (u64::from(counts) * u64::from(vref_mv) / u64::from(full_scale)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_cal() -> Calibration {
        Calibration::from_f32(0.5, -100.0)
    }

    #[test]
    fn default_coefficients_in_q6() {
        let c = default_cal();
        assert_eq!(c.slope().raw(), 32);
        assert_eq!(c.intercept().raw(), -6400);
    }

    #[test]
    fn reference_points() {
        let c = default_cal();
        assert_eq!(c.concentration(300, 1000), 50);
        assert_eq!(c.concentration(0, 1000), 0);
        assert_eq!(c.concentration(3300, 1000), 1000);
    }

    #[test]
    fn below_intercept_clamps_to_zero() {
        assert_eq!(default_cal().concentration(199, 1000), 0);
        assert_eq!(default_cal().concentration(202, 1000), 1);
    }

    #[test]
    fn counts_scale_to_reference() {
        assert_eq!(counts_to_mv(4095, 3300, 4096), 3299);
        assert_eq!(counts_to_mv(2048, 3300, 4096), 1650);
        assert_eq!(counts_to_mv(372, 3300, 4096), 299);
        assert_eq!(counts_to_mv(10, 3300, 0), 0);
    }

    #[test]
    fn fractional_slope_truncates() {
        let c = Calibration::from_f32(0.01, 0.0);
        assert_eq!(c.slope().raw(), 0);
        assert_eq!(c.concentration(3000, 1000), 0);
    }
}
