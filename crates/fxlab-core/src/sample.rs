//! Built-in sample images.
//!
//! The harness offers a fixed set of named test images. They are generated
//! procedurally so no bitmap decoding is needed; each has a distinct frequency
//! content so filters behave visibly differently on them.
//!
//! | Name        | Content |
//! |-------------|---------|
//! | `peppers`   | Smooth overlapping colour blobs |
//! | `baboon`    | High-frequency hashed texture over stripes |
//! | `lena`      | Soft diagonal gradients with a vignette |
//! | `doughnuts` | Concentric hard-edged rings |
//!
//! ```rust
//! use fxlab_core::SampleImage;
//!
//! let sample: SampleImage = "BaBoOn".parse().unwrap();
//! let img = sample.render(64, 64).unwrap();
//! assert_eq!(img.dimensions(), (64, 64));
//! ```

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::image::CHANNELS;
use crate::pixel::quantize;
use crate::{Error, Result, RgbaImage};

/// Default edge length of rendered sample images.
pub const DEFAULT_SAMPLE_SIZE: u32 = 512;

/// Named synthetic test image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleImage {
    /// Smooth colour blobs.
    Peppers,
    /// High-frequency texture.
    #[default]
    Baboon,
    /// Soft gradients.
    Lena,
    /// Concentric rings.
    Doughnuts,
}

impl SampleImage {
    /// All samples in menu order.
    pub const fn all() -> &'static [Self] {
        &[Self::Peppers, Self::Baboon, Self::Lena, Self::Doughnuts]
    }

    /// Lower-case name used for lookup.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Peppers => "peppers",
            Self::Baboon => "baboon",
            Self::Lena => "lena",
            Self::Doughnuts => "doughnuts",
        }
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Peppers => "Peppers",
            Self::Baboon => "Baboon",
            Self::Lena => "Lena",
            Self::Doughnuts => "Doughnuts",
        }
    }

    /// Renders the sample at the given size.
    pub fn render(self, width: u32, height: u32) -> Result<RgbaImage> {
        let mut img = RgbaImage::new(width, height)?;
        let stride = img.stride();
        let (w, h) = (width as f32, height as f32);

        img.data_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                let v = (y as f32 + 0.5) / h;
                for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
                    let u = (x as f32 + 0.5) / w;
                    let [r, g, b] = match self {
                        Self::Peppers => peppers(u, v),
                        Self::Baboon => baboon(x as u32, y as u32, u, v),
                        Self::Lena => lena(u, v),
                        Self::Doughnuts => doughnuts(u, v),
                    };
                    px[0] = quantize(r);
                    px[1] = quantize(g);
                    px[2] = quantize(b);
                    px[3] = 255;
                }
            });

        Ok(img)
    }
}

impl fmt::Display for SampleImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SampleImage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|sample| sample.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownSample(s.to_string()))
    }
}

/// Uniform noise image with opaque alpha, reproducible from `seed`.
pub fn noise(width: u32, height: u32, seed: u64) -> Result<RgbaImage> {
    let mut img = RgbaImage::new(width, height)?;
    img.data_mut()
        .par_chunks_mut(CHANNELS)
        .enumerate()
        .for_each(|(i, px)| {
            let bits = hash64(seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            px[0] = bits as u8;
            px[1] = (bits >> 8) as u8;
            px[2] = (bits >> 16) as u8;
            px[3] = 255;
        });
    Ok(img)
}

// splitmix64 finaliser
fn hash64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn blob(u: f32, v: f32, cx: f32, cy: f32, radius: f32) -> f32 {
    let d2 = (u - cx).powi(2) + (v - cy).powi(2);
    (-d2 / (radius * radius)).exp()
}

fn peppers(u: f32, v: f32) -> [f32; 3] {
    let red = blob(u, v, 0.3, 0.35, 0.25) + 0.6 * blob(u, v, 0.75, 0.7, 0.2);
    let green = blob(u, v, 0.7, 0.3, 0.22) + 0.4 * blob(u, v, 0.25, 0.75, 0.18);
    let yellow = blob(u, v, 0.5, 0.6, 0.15);
    [red + yellow, green + 0.8 * yellow, 0.1 + 0.2 * green]
}

fn baboon(x: u32, y: u32, u: f32, v: f32) -> [f32; 3] {
    let n = hash64(((y as u64) << 32) | x as u64);
    let grain = (n & 0xFF) as f32 / 255.0;
    let stripes = 0.5 + 0.5 * (u * 60.0 + (v * 9.0).sin() * 4.0).sin();
    [
        0.55 * stripes + 0.45 * grain,
        0.35 * stripes + 0.4 * ((n >> 8) & 0xFF) as f32 / 255.0,
        0.6 * (1.0 - stripes) + 0.3 * grain,
    ]
}

fn lena(u: f32, v: f32) -> [f32; 3] {
    let d = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();
    let vignette = (1.0 - d * 1.2).max(0.0);
    [
        (0.8 * (1.0 - v) + 0.3 * u) * vignette + 0.1,
        (0.5 * u + 0.3 * v) * vignette,
        (0.4 * v + 0.2) * vignette,
    ]
}

fn doughnuts(u: f32, v: f32) -> [f32; 3] {
    let d = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();
    let ring = ((d * 24.0) as u32) % 3;
    match ring {
        0 => [0.9, 0.6, 0.3],
        1 => [0.95, 0.4, 0.6],
        _ => [0.25, 0.15, 0.1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("PEPPERS".parse::<SampleImage>().unwrap(), SampleImage::Peppers);
        assert_eq!(" lena ".parse::<SampleImage>().unwrap(), SampleImage::Lena);
        assert!(matches!(
            "mandrill".parse::<SampleImage>(),
            Err(Error::UnknownSample(_))
        ));
    }

    #[test]
    fn render_is_deterministic_and_opaque() {
        for &sample in SampleImage::all() {
            let a = sample.render(32, 16).unwrap();
            let b = sample.render(32, 16).unwrap();
            assert_eq!(a, b, "{sample} not deterministic");
            assert!(a.data().chunks_exact(4).all(|px| px[3] == 255));
        }
    }

    #[test]
    fn samples_differ() {
        let a = SampleImage::Peppers.render(16, 16).unwrap();
        let b = SampleImage::Doughnuts.render(16, 16).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn noise_depends_on_seed() {
        let a = noise(8, 8, 1).unwrap();
        let b = noise(8, 8, 2).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, noise(8, 8, 1).unwrap());
    }
}
