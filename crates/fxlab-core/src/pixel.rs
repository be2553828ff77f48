//! Pixel value helpers.
//!
//! Filters read 8-bit channels as normalised floats in `[0, 1]` and write
//! floats back through [`quantize`], which clamps and truncates the same way
//! on every backend so that outputs stay comparable within a tolerance of one
//! code value.

/// Rec.601 luma coefficients (R, G, B).
pub const REC601_LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Scale factor between an 8-bit code value and a normalised float.
pub const UNORM8_SCALE: f32 = 255.0;

/// Converts an 8-bit code value to a normalised float.
#[inline]
pub fn unorm(v: u8) -> f32 {
    v as f32 / UNORM8_SCALE
}

/// Clamps a normalised float to `[0, 1]` and truncates to an 8-bit code value.
///
/// NaN maps to 0.
#[inline]
pub fn quantize(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * UNORM8_SCALE) as u8
}

/// Rec.601 luma of a normalised RGB triple.
#[inline]
pub fn luma_rec601(r: f32, g: f32, b: f32) -> f32 {
    r * REC601_LUMA[0] + g * REC601_LUMA[1] + b * REC601_LUMA[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantize_clamps() {
        assert_eq!(quantize(-0.5), 0);
        assert_eq!(quantize(2.0), 255);
        assert_eq!(quantize(f32::NAN), 0);
    }

    #[test]
    fn quantize_truncates() {
        // 0.5 * 255 = 127.5 truncates to 127
        assert_eq!(quantize(0.5), 127);
    }

    #[test]
    fn unorm_round_trip_is_exact_for_code_values() {
        for v in [0u8, 1, 127, 128, 254, 255] {
            assert_eq!(quantize(unorm(v) + 1e-4), v);
        }
    }

    #[test]
    fn luma_of_white_is_one() {
        assert_relative_eq!(luma_rec601(1.0, 1.0, 1.0), 1.0, epsilon = 1e-6);
    }
}
