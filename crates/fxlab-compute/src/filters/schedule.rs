//! Compiled CPU schedules.
//!
//! Same algorithms as [`kernels`](super::kernels), scheduled for throughput:
//! rows are distributed across the rayon pool and the box blur is split into
//! separable horizontal and vertical passes. Floating-point summation order
//! differs from the reference, so results may differ by one code value.

use rayon::prelude::*;

use fxlab_core::RgbaImage;
use fxlab_core::image::CHANNELS;
use fxlab_core::pixel::quantize;

use super::Filter;

/// Runs `filter` over the whole image with the row-parallel schedule.
///
/// `output` must have the same dimensions as `input`.
pub fn run(filter: Filter, input: &RgbaImage, output: &mut RgbaImage) {
    match filter {
        Filter::Copy => copy(input, output),
        Filter::Blur => blur_separable(input, output),
        Filter::Bilateral | Filter::Sharpen | Filter::Sobel => rows(filter, input, output),
    }
}

fn copy(input: &RgbaImage, output: &mut RgbaImage) {
    let stride = input.stride();
    output
        .data_mut()
        .par_chunks_mut(stride)
        .zip(input.data().par_chunks(stride))
        .for_each(|(dst, src)| dst.copy_from_slice(src));
}

fn rows(filter: Filter, input: &RgbaImage, output: &mut RgbaImage) {
    let stride = input.stride();
    output
        .data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
                px.copy_from_slice(&filter.kernel(input, x as u32, y as u32));
            }
        });
}

/// 5-tap horizontal mean into an RGB float plane, then 5-tap vertical mean.
fn blur_separable(input: &RgbaImage, output: &mut RgbaImage) {
    const TAPS: i64 = 2;
    let (w, h) = (input.width() as usize, input.height() as usize);
    let row_len = w * 3;

    let mut horizontal = vec![0.0f32; w * h * 3];
    horizontal
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                for c in 0..3 {
                    let mut sum = 0.0f32;
                    for i in -TAPS..=TAPS {
                        sum += input.sample(x as i64 + i, y as i64, c);
                    }
                    row[x * 3 + c] = sum / 5.0;
                }
            }
        });

    let stride = input.stride();
    let src = input.data();
    output
        .data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                for c in 0..3 {
                    let mut sum = 0.0f32;
                    for j in -TAPS..=TAPS {
                        let sy = (y as i64 + j).clamp(0, h as i64 - 1) as usize;
                        sum += horizontal[sy * row_len + x * 3 + c];
                    }
                    row[x * CHANNELS + c] = quantize(sum / 5.0);
                }
                row[x * CHANNELS + 3] = src[y * stride + x * CHANNELS + 3];
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxlab_core::SampleImage;

    fn reference(filter: Filter, input: &RgbaImage) -> RgbaImage {
        let mut out = input.blank_like();
        for y in 0..input.height() {
            for x in 0..input.width() {
                out.put_pixel(x, y, filter.kernel(input, x, y));
            }
        }
        out
    }

    #[test]
    fn compiled_matches_reference_within_one() {
        let input = SampleImage::Baboon.render(37, 23).unwrap();
        for &filter in Filter::all() {
            let expected = reference(filter, &input);
            let mut out = input.blank_like();
            run(filter, &input, &mut out);
            let worst = expected
                .data()
                .iter()
                .zip(out.data())
                .map(|(&a, &b)| (a as i32 - b as i32).abs())
                .max()
                .unwrap_or(0);
            assert!(worst <= 1, "{filter}: max diff {worst}");
        }
    }

    #[test]
    fn copy_is_exact() {
        let input = SampleImage::Lena.render(16, 9).unwrap();
        let mut out = input.blank_like();
        run(Filter::Copy, &input, &mut out);
        assert_eq!(out, input);
    }
}
