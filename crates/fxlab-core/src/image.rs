//! RGBA image buffer.
//!
//! [`RgbaImage`] is the single pixel container used throughout fxlab. It is
//! deliberately simple: 8 bits per channel, four interleaved channels, rows
//! stored top-to-bottom with no padding.
//!
//! # Memory Layout
//!
//! ```text
//! Memory: [R G B A R G B A ...]  <- Row 0
//!         [R G B A R G B A ...]  <- Row 1
//!         ...
//! ```
//!
//! # Edge Handling
//!
//! Filters sample neighbourhoods that extend past the image border. The
//! [`RgbaImage::sample`] family clamps coordinates to the nearest edge pixel,
//! so a 5x5 window centred on `(0, 0)` reads the corner pixel repeatedly.
//!
//! # Usage
//!
//! ```rust
//! use fxlab_core::RgbaImage;
//!
//! let mut img = RgbaImage::new(4, 4).unwrap();
//! img.set_unorm(1, 2, 0, 1.0);
//! assert_eq!(img.pixel(1, 2), [255, 0, 0, 0]);
//! // Out-of-range reads clamp to the edge
//! assert_eq!(img.sample(-3, 2, 0), img.sample(0, 2, 0));
//! ```

use crate::pixel::{luma_rec601, quantize, unorm};
use crate::{Error, Result};

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 4;

/// 8-bit RGBA image buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct RgbaImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RgbaImage {
    /// Creates a zero-filled image.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let size = Self::byte_len(width, height)?;
        Ok(Self {
            data: vec![0; size],
            width,
            height,
        })
    }

    /// Creates an image where every pixel has the given RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let mut img = Self::new(width, height)?;
        for px in img.data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgba);
        }
        Ok(img)
    }

    /// Wraps existing RGBA bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::byte_len(width, height)?;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates a zero-filled image with the same dimensions as `self`.
    ///
    /// Used to allocate an output buffer matching an input.
    pub fn blank_like(&self) -> Self {
        Self {
            data: vec![0; self.data.len()],
            width: self.width,
            height: self.height,
        }
    }

    fn byte_len(width: u32, height: u32) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or(Error::InvalidDimensions { width, height })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Raw RGBA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the image and returns its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// True when `other` has the same width and height.
    pub fn same_dimensions(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions()
    }

    /// Returns [`Error::DimensionMismatch`] unless `other` matches `self`.
    pub fn ensure_same_dimensions(&self, other: &Self) -> Result<()> {
        if self.same_dimensions(other) {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            })
        }
    }

    /// Overwrites this image's pixels with `src`'s.
    pub fn copy_from(&mut self, src: &Self) -> Result<()> {
        self.ensure_same_dimensions(src)?;
        self.data.copy_from_slice(&src.data);
        Ok(())
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    #[inline]
    fn clamped_offset(&self, x: i64, y: i64) -> usize {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        self.offset(cx, cy)
    }

    /// RGBA bytes of an in-bounds pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let o = self.offset(x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2], self.data[o + 3]]
    }

    /// Sets an in-bounds pixel.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let o = self.offset(x, y);
        self.data[o..o + CHANNELS].copy_from_slice(&rgba);
    }

    /// Normalised channel value with edge clamping.
    #[inline]
    pub fn sample(&self, x: i64, y: i64, c: usize) -> f32 {
        unorm(self.data[self.clamped_offset(x, y) + c])
    }

    /// Normalised Rec.601 luma with edge clamping.
    #[inline]
    pub fn sample_gray(&self, x: i64, y: i64) -> f32 {
        let o = self.clamped_offset(x, y);
        luma_rec601(
            unorm(self.data[o]),
            unorm(self.data[o + 1]),
            unorm(self.data[o + 2]),
        )
    }

    /// Writes a normalised value to one channel of an in-bounds pixel.
    #[inline]
    pub fn set_unorm(&mut self, x: u32, y: u32, c: usize, v: f32) {
        let o = self.offset(x, y);
        self.data[o + c] = quantize(v);
    }

    /// Writes a grey value to RGB and sets alpha to opaque.
    #[inline]
    pub fn set_gray(&mut self, x: u32, y: u32, v: f32) {
        let g = quantize(v);
        self.put_pixel(x, y, [g, g, g, 255]);
    }
}

impl std::fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}
