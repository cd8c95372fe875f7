//! Q-format fixed-point arithmetic.
//!
//! ```text
//!   Fixed<FRAC>(raw: i32)      value = raw / 2^FRAC
//!
//!   Q8  (FRAC = 8)   Kalman estimate / covariance / gain, filter alpha
//!   Q6  (FRAC = 6)   gas calibration coefficients
//! ```
//!
//! Products and quotients go through an `i64` intermediate and are narrowed
//! with saturation, so overflow clamps instead of wrapping.  Right shifts are
//! arithmetic (floor towards negative infinity), which is the rounding the
//! firmware's estimators were tuned against.

use core::fmt;
use core::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Signed 32-bit fixed-point number with `FRAC` fractional bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed<const FRAC: u32>(i32);

/// 8 fractional bits.
pub type Q8 = Fixed<8>;
/// 6 fractional bits.
pub type Q6 = Fixed<6>;

#[inline]
const fn saturate(v: i64) -> i32 {
    if v > i32::MAX as i64 {
        i32::MAX
    } else if v < i32::MIN as i64 {
        i32::MIN
    } else {
        v as i32
    }
}

impl<const FRAC: u32> Fixed<FRAC> {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << FRAC);
    pub const MAX: Self = Self(i32::MAX);
    pub const MIN: Self = Self(i32::MIN);

    /// Wrap an already-scaled raw value.
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The underlying scaled integer.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Scale an integer into the format, saturating at the representable range.
    pub const fn from_int(v: i32) -> Self {
        Self(saturate((v as i64) << FRAC))
    }

    /// Convert from floating point, truncating toward zero.
    ///
    /// Non-finite and out-of-range inputs saturate (`as` semantics).
    pub fn from_f32(v: f32) -> Self {
        Self((v * (1u32 << FRAC) as f32) as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1u32 << FRAC) as f32
    }

    /// Integer part, rounded toward negative infinity.
    pub const fn to_int(self) -> i32 {
        self.0 >> FRAC
    }

    /// Nearest integer, halves rounded up.
    pub const fn round_to_int(self) -> i32 {
        if FRAC == 0 {
            return self.0;
        }
        saturate(((self.0 as i64) + (1i64 << (FRAC - 1))) >> FRAC)
    }

    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// `self * rhs` in the same format.
    pub const fn saturating_mul(self, rhs: Self) -> Self {
        Self(saturate(((self.0 as i64) * (rhs.0 as i64)) >> FRAC))
    }

    /// Multiply by a plain integer, staying in the format.
    pub const fn scale(self, x: i32) -> Self {
        Self(saturate((self.0 as i64) * (x as i64)))
    }

    /// Scale a plain integer by this coefficient: `(raw * x) >> FRAC`.
    pub const fn mul_int(self, x: i32) -> i32 {
        saturate(((self.0 as i64) * (x as i64)) >> FRAC)
    }

    /// `self / rhs`, or `None` on division by zero.
    pub const fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        Some(Self(saturate(((self.0 as i64) << FRAC) / (rhs.0 as i64))))
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub const fn max(self, other: Self) -> Self {
        if self.0 >= other.0 { self } else { other }
    }

    pub const fn min(self, other: Self) -> Self {
        if self.0 <= other.0 { self } else { other }
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl<const FRAC: u32> Add for Fixed<FRAC> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl<const FRAC: u32> Sub for Fixed<FRAC> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl<const FRAC: u32> Neg for Fixed<FRAC> {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl<const FRAC: u32> fmt::Debug for Fixed<FRAC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}({} = {:.3})", FRAC, self.0, self.to_f32())
    }
}

impl<const FRAC: u32> fmt::Display for Fixed<FRAC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.to_f32())
    }
}

// ───────────────────────────────────────────────────────────────
// Integer square root
// ───────────────────────────────────────────────────────────────

/// Floor square root, digit-by-digit (no division, no float).
///
/// For inputs below 65536 this is bit-identical to the 16-bit routine the
/// signal-quality thresholds were calibrated with.
pub const fn isqrt(x: u32) -> u32 {
    let mut x = x;
    let mut res = 0u32;
    let mut bit = 1u32 << 30;
    while bit > x {
        bit >>= 2;
    }
    while bit != 0 {
        if x >= res + bit {
            x -= res + bit;
            res = (res >> 1) + bit;
        } else {
            res >>= 1;
        }
        bit >>= 2;
    }
    res
}

/// 64-bit variant of [`isqrt`] for variance products.
pub const fn isqrt_u64(x: u64) -> u64 {
    let mut x = x;
    let mut res = 0u64;
    let mut bit = 1u64 << 62;
    while bit > x {
        bit >>= 2;
    }
    while bit != 0 {
        if x >= res + bit {
            x -= res + bit;
            res = (res >> 1) + bit;
        } else {
            res >>= 1;
        }
        bit >>= 2;
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_roundtrip() {
        assert_eq!(Q8::from_int(70).raw(), 70 * 256);
        assert_eq!(Q8::from_int(70).to_int(), 70);
        assert_eq!(Q6::from_int(-100).raw(), -6400);
    }

    #[test]
    fn to_int_floors_negative() {
        assert_eq!(Q8::from_raw(-1).to_int(), -1);
        assert_eq!(Q8::from_raw(-256).to_int(), -1);
        assert_eq!(Q8::from_raw(255).to_int(), 0);
    }

    #[test]
    fn round_to_int_rounds_half_up() {
        assert_eq!(Q8::from_raw(128).round_to_int(), 1);
        assert_eq!(Q8::from_raw(127).round_to_int(), 0);
        assert_eq!(Q8::from_raw(-129).round_to_int(), -1);
    }

    #[test]
    fn from_f32_truncates_toward_zero() {
        assert_eq!(Q6::from_f32(0.5).raw(), 32);
        assert_eq!(Q6::from_f32(-100.0).raw(), -6400);
        assert_eq!(Q6::from_f32(0.999).raw(), 63);
        assert_eq!(Q6::from_f32(-0.999).raw(), -63);
    }

    #[test]
    fn from_f32_saturates() {
        assert_eq!(Q8::from_f32(f32::INFINITY), Q8::MAX);
        assert_eq!(Q8::from_f32(-1.0e12), Q8::MIN);
        assert_eq!(Q8::from_f32(f32::NAN), Q8::ZERO);
    }

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(Q8::MAX + Q8::ONE, Q8::MAX);
        assert_eq!(Q8::MIN - Q8::ONE, Q8::MIN);
        assert_eq!(Q8::MAX.saturating_mul(Q8::from_int(2)), Q8::MAX);
        assert_eq!(-Q8::MIN, Q8::MAX);
        assert_eq!(Q8::from_int(1_000_000).mul_int(1_000_000), i32::MAX);
    }

    #[test]
    fn mul_and_div() {
        let half = Q8::from_raw(128);
        assert_eq!(Q8::from_int(10).saturating_mul(half), Q8::from_int(5));
        assert_eq!(Q8::from_int(10).checked_div(half), Some(Q8::from_int(20)));
        assert_eq!(Q8::ONE.checked_div(Q8::ZERO), None);
        assert_eq!(Q8::from_raw(243).mul_int(100), 94);
        assert_eq!(Q8::from_raw(243).mul_int(-100), -95);
        assert_eq!(Q6::from_raw(32).scale(300), Q6::from_int(150));
        assert_eq!(Q6::MAX.scale(2), Q6::MAX);
    }

    #[test]
    fn isqrt_matches_floor_sqrt() {
        for x in 0u32..70_000 {
            let r = isqrt(x);
            assert!(r * r <= x && (r + 1) * (r + 1) > x, "isqrt({x}) = {r}");
        }
        assert_eq!(isqrt(u32::MAX), 65_535);
    }

    #[test]
    fn isqrt_u64_large() {
        assert_eq!(isqrt_u64(1 << 40), 1 << 20);
        assert_eq!(isqrt_u64(u64::MAX), u64::from(u32::MAX));
        assert_eq!(isqrt_u64(99), 9);
    }
}
