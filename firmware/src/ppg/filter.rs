//! Fixed-point conditioning of the primary PPG window.
//!
//! Runs over a work copy of the window; the raw ring is never touched.  The
//! caller must only filter a full window.
//!
//! ```text
//!   work ──▶ high_pass (α = 243/256) ──▶ scratch ──▶ moving_average (W = 9) ──▶ work
//! ```
//!
//! The averaging stage reads the unfiltered neighbours from `scratch`, so
//! it is a true centred window.  Its first and last `W / 2` outputs are the
//! high-passed samples unchanged; peak detection skips that band
//! (see [`SETTLED_EDGE`]).

use crate::fixed::Q8;

use super::buffer::saturate_i16;

/// One-pole coefficient, ≈ 0.95.
pub const HP_ALPHA: Q8 = Q8::from_raw(243);

/// Moving-average width (odd).
pub const MA_WINDOW: usize = 9;

/// Samples at each end of a conditioned window whose value or neighbours
/// were not averaged.
pub const SETTLED_EDGE: usize = MA_WINDOW / 2 + 1;

/// Run the full conditioning chain on `signal`, using `scratch` (same
/// length) as the intermediate buffer.
pub fn condition(signal: &mut [i16], scratch: &mut [i16]) {
    high_pass(signal);
    scratch.copy_from_slice(signal);
    moving_average::<MA_WINDOW>(scratch, signal);
}

/// One-pole section `y[i] = α·(y[i-1] + x[i] − x[i-1])`, in place.
///
/// The window starts at rest (`y[0] = 0`), so a constant baseline is removed
/// without a start-up transient.
pub fn high_pass(signal: &mut [i16]) {
    let Some((first, rest)) = signal.split_first_mut() else {
        return;
    };
    let mut x_prev = i32::from(*first);
    let mut y_prev = 0i32;
    *first = 0;
    for s in rest {
        let x = i32::from(*s);
        let y = saturate_i16(HP_ALPHA.mul_int(y_prev + x - x_prev));
        *s = y;
        x_prev = x;
        y_prev = i32::from(y);
    }
}

/// Centred moving average of width `W` from `input` into `output`.
///
/// The first and last `W / 2` samples are copied through.  Inputs shorter
/// than `W` are copied unchanged.
pub fn moving_average<const W: usize>(input: &[i16], output: &mut [i16]) {
    let half = W / 2;
    output.copy_from_slice(input);
    if input.len() < W {
        return;
    }
    for (i, window) in input.windows(W).enumerate() {
        let sum: i32 = window.iter().map(|&v| i32::from(v)).sum();
        output[i + half] = (sum / W as i32) as i16;
    }
}
