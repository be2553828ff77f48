//! Scalar per-pixel kernels.
//!
//! Each function computes a single output pixel from an edge-clamped
//! neighbourhood. The reference backend calls them in a plain loop, the
//! parallel-compute backend calls them once per work-item, so both produce
//! bit-identical results.

use fxlab_core::RgbaImage;
use fxlab_core::pixel::quantize;

/// Spatial sigma of the bilateral filter, in pixels.
const BILATERAL_SIGMA_SPATIAL: f32 = 3.0;
/// Range sigma of the bilateral filter, in normalised RGB distance.
const BILATERAL_SIGMA_RANGE: f32 = 0.2;

const SHARPEN_MASK: [[f32; 3]; 3] = [
    [-1.0, -1.0, -1.0],
    [-1.0, 8.0, -1.0],
    [-1.0, -1.0, -1.0],
];

const SOBEL_MASK: [[f32; 3]; 3] = [
    [-1.0, -2.0, -1.0],
    [0.0, 0.0, 0.0],
    [1.0, 2.0, 1.0],
];

#[inline]
fn alpha(input: &RgbaImage, x: i64, y: i64) -> u8 {
    input.pixel(x as u32, y as u32)[3]
}

pub fn copy(input: &RgbaImage, x: i64, y: i64) -> [u8; 4] {
    input.pixel(x as u32, y as u32)
}

pub fn blur(input: &RgbaImage, x: i64, y: i64) -> [u8; 4] {
    let mut sum = [0.0f32; 3];
    for j in -2..=2 {
        for i in -2..=2 {
            for (c, s) in sum.iter_mut().enumerate() {
                *s += input.sample(x + i, y + j, c);
            }
        }
    }
    [
        quantize(sum[0] / 25.0),
        quantize(sum[1] / 25.0),
        quantize(sum[2] / 25.0),
        alpha(input, x, y),
    ]
}

pub fn sharpen(input: &RgbaImage, x: i64, y: i64) -> [u8; 4] {
    let mut sum = [0.0f32; 3];
    for j in -1..=1i64 {
        for i in -1..=1i64 {
            let w = SHARPEN_MASK[(i + 1) as usize][(j + 1) as usize];
            for (c, s) in sum.iter_mut().enumerate() {
                *s += input.sample(x + i, y + j, c) * w;
            }
        }
    }
    [
        quantize(sum[0] / 8.0 + input.sample(x, y, 0)),
        quantize(sum[1] / 8.0 + input.sample(x, y, 1)),
        quantize(sum[2] / 8.0 + input.sample(x, y, 2)),
        alpha(input, x, y),
    ]
}

pub fn sobel(input: &RgbaImage, x: i64, y: i64) -> [u8; 4] {
    let mut gx = 0.0f32;
    let mut gy = 0.0f32;
    for j in -1..=1i64 {
        for i in -1..=1i64 {
            let g = input.sample_gray(x + i, y + j);
            gx += g * SOBEL_MASK[(i + 1) as usize][(j + 1) as usize];
            gy += g * SOBEL_MASK[(j + 1) as usize][(i + 1) as usize];
        }
    }
    let v = quantize((gx * gx + gy * gy).sqrt());
    [v, v, v, 255]
}

pub fn bilateral(input: &RgbaImage, x: i64, y: i64) -> [u8; 4] {
    let centre = [
        input.sample(x, y, 0),
        input.sample(x, y, 1),
        input.sample(x, y, 2),
    ];

    let mut coeff = 0.0f32;
    let mut sum = [0.0f32; 3];
    for j in -2..=2i64 {
        for i in -2..=2i64 {
            let px = [
                input.sample(x + i, y + j, 0),
                input.sample(x + i, y + j, 1),
                input.sample(x + i, y + j, 2),
            ];

            let spatial = ((i * i + j * j) as f32).sqrt() / BILATERAL_SIGMA_SPATIAL;
            let mut weight = (-0.5 * spatial * spatial).exp();

            let dist = ((px[0] - centre[0]).powi(2)
                + (px[1] - centre[1]).powi(2)
                + (px[2] - centre[2]).powi(2))
            .sqrt()
                / BILATERAL_SIGMA_RANGE;
            weight *= (-0.5 * dist * dist).exp();

            coeff += weight;
            for c in 0..3 {
                sum[c] += weight * px[c];
            }
        }
    }

    [
        quantize(sum[0] / coeff),
        quantize(sum[1] / coeff),
        quantize(sum[2] / coeff),
        alpha(input, x, y),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::filled(8, 8, rgba).unwrap()
    }

    #[test]
    fn blur_of_flat_image_is_flat() {
        let img = flat([100, 150, 200, 255]);
        for (x, y) in [(0, 0), (3, 4), (7, 7)] {
            let px = blur(&img, x, y);
            for c in 0..3 {
                assert!((px[c] as i32 - img.pixel(0, 0)[c] as i32).abs() <= 1);
            }
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn sharpen_of_flat_image_is_identity() {
        let img = flat([40, 80, 120, 200]);
        let px = sharpen(&img, 4, 4);
        for c in 0..4 {
            assert!((px[c] as i32 - img.pixel(4, 4)[c] as i32).abs() <= 1);
        }
    }

    #[test]
    fn sobel_of_flat_image_is_black() {
        let img = flat([90, 90, 90, 255]);
        assert_eq!(sobel(&img, 2, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn sobel_detects_vertical_edge() {
        let mut img = flat([0, 0, 0, 255]);
        for y in 0..8 {
            for x in 4..8 {
                img.put_pixel(x, y, [255, 255, 255, 255]);
            }
        }
        assert_eq!(sobel(&img, 4, 4)[0], 255);
        assert_eq!(sobel(&img, 1, 4)[0], 0);
    }

    #[test]
    fn bilateral_preserves_flat_regions() {
        let img = flat([10, 20, 30, 255]);
        let px = bilateral(&img, 0, 0);
        for c in 0..3 {
            assert!((px[c] as i32 - img.pixel(0, 0)[c] as i32).abs() <= 1);
        }
    }

    #[test]
    fn copy_is_exact() {
        let img = flat([1, 2, 3, 4]);
        assert_eq!(copy(&img, 5, 6), [1, 2, 3, 4]);
    }
}
