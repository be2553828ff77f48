//! Filter catalogue.
//!
//! The order of [`Filter::all`] is the filter index space used by the
//! harness, the launch parameters and the processing boundary.

use std::fmt;
use std::str::FromStr;

use fxlab_core::RgbaImage;

use crate::ComputeError;

pub mod kernels;
pub mod schedule;

/// Image filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Pass-through copy.
    Copy,
    /// 5x5 edge-preserving bilateral filter.
    Bilateral,
    /// 5x5 box blur.
    Blur,
    /// 3x3 sharpen.
    Sharpen,
    /// Sobel gradient magnitude.
    Sobel,
}

impl Filter {
    /// All filters in index order.
    pub const fn all() -> &'static [Self] {
        &[Self::Copy, Self::Bilateral, Self::Blur, Self::Sharpen, Self::Sobel]
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Copy => "Copy",
            Self::Bilateral => "Bilateral",
            Self::Blur => "Blur",
            Self::Sharpen => "Sharpen",
            Self::Sobel => "Sobel",
        }
    }

    /// Filter at `index` in [`Filter::all`].
    pub fn from_index(index: usize) -> Result<Self, ComputeError> {
        Self::all()
            .get(index)
            .copied()
            .ok_or(ComputeError::InvalidFilter {
                index,
                count: Self::all().len(),
            })
    }

    /// Position in [`Filter::all`].
    pub fn index(self) -> usize {
        Self::all()
            .iter()
            .position(|&f| f == self)
            .unwrap_or_default()
    }

    /// Neighbourhood radius read around each output pixel.
    pub const fn radius(self) -> u32 {
        match self {
            Self::Copy => 0,
            Self::Sharpen | Self::Sobel => 1,
            Self::Bilateral | Self::Blur => 2,
        }
    }

    /// Computes one output pixel with the scalar reference kernel.
    #[inline]
    pub fn kernel(self, input: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
        let (x, y) = (x as i64, y as i64);
        match self {
            Self::Copy => kernels::copy(input, x, y),
            Self::Bilateral => kernels::bilateral(input, x, y),
            Self::Blur => kernels::blur(input, x, y),
            Self::Sharpen => kernels::sharpen(input, x, y),
            Self::Sobel => kernels::sobel(input, x, y),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter '{s}'"))
    }
}
