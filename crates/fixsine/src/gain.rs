//! Fixed-point gain stage.
//!
//! A gain register holds `round(g * 2^gain_bits)` for `g` in `[0, 1]`, so unity
//! is exactly `2^gain_bits` and needs `gain_bits + 1` bits of storage.

pub const MIN_GAIN_BITS: u8 = 1;
pub const MAX_GAIN_BITS: u8 = 31;
pub const DEFAULT_GAIN_BITS: u8 = 16;

/// Clamp a register width into the supported range.
pub fn clamp_bits(gain_bits: u8) -> u8 {
    gain_bits.clamp(MIN_GAIN_BITS, MAX_GAIN_BITS)
}

/// Register value representing a gain of exactly 1.
#[inline]
pub fn unity(gain_bits: u8) -> u32 {
    1 << gain_bits
}

/// Quantize a normalized gain. Values outside `[0, 1]` are clamped, NaN is 0.
pub fn quantize(gain: f32, gain_bits: u8) -> u32 {
    let gain = if gain.is_nan() { 0.0 } else { gain.clamp(0.0, 1.0) };
    (gain as f64 * unity(gain_bits) as f64).round() as u32
}

/// Normalized value of a gain register.
pub fn normalize(register: u32, gain_bits: u8) -> f32 {
    (register as f64 / unity(gain_bits) as f64) as f32
}

/// Scale `sample` by a gain register: widened product, rounding bias, shift.
///
/// With `register <= 2^gain_bits` the result magnitude never exceeds
/// `|sample|`, so it always fits back into the sample width.
#[inline]
pub fn apply(sample: i32, register: u32, gain_bits: u8) -> i32 {
    let bias = 1i64 << (gain_bits - 1);
    ((sample as i64 * register as i64 + bias) >> gain_bits) as i32
}
