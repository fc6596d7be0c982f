//! Fixed-point Hann window table
//!
//! Coefficients are scaled by `2^WINDOW_BITS`, so a unit gain is
//! `1 << WINDOW_BITS` and windowed samples are shifted right by
//! `WINDOW_BITS` after multiplication.

use std::f32::consts::PI;

/// Fractional bits of window coefficients
pub const WINDOW_BITS: u32 = 12;

/// Fixed-point value of 1.0
pub const WINDOW_UNITY: i16 = 1 << WINDOW_BITS;

/// Periodic Hann coefficient `index` of a `size`-point window
///
/// w[i] = 0.5 - 0.5*cos(2π(i + 0.5)/size), rounded half-up to fixed point.
/// Computed in single precision.
pub fn hann_coefficient(index: usize, size: usize) -> i16 {
    let arg = PI * 2.0 / size as f32;
    let value = 0.5 - 0.5 * (arg * (index as f32 + 0.5)).cos();
    (value * (1u32 << WINDOW_BITS) as f32 + 0.5).floor() as i16
}

/// Fill `coefficients` with a Hann window of its own length
pub fn fill_hann(coefficients: &mut [i16]) {
    let size = coefficients.len();
    for (i, c) in coefficients.iter_mut().enumerate() {
        *c = hann_coefficient(i, size);
    }
}
