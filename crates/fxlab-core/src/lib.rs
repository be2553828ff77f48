//! # fxlab-core
//!
//! Core types shared by every fxlab crate.
//!
//! - [`RgbaImage`] - 8-bit RGBA pixel buffer used as filter input and output
//! - [`pixel`] - Quantisation and luma helpers used by filter kernels
//! - [`SampleImage`] - Built-in synthetic test images selectable by name
//! - [`Error`] - Error type for buffer construction and lookup failures
//!
//! ## Crate Structure
//!
//! ```text
//! fxlab-core (this crate)
//!    ^
//!    |
//!    +-- fxlab-compute (filters, backends, processing boundary)
//!    +-- fxlab-harness (job orchestration, configuration, image state)
//!    +-- fxlab-cli     (console front end)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod pixel;
pub mod sample;

pub use error::{Error, Result};
pub use image::RgbaImage;
pub use sample::SampleImage;

/// Prelude module for convenient imports.
///
/// ```
/// use fxlab_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::RgbaImage;
    pub use crate::pixel::{luma_rec601, quantize, unorm};
    pub use crate::sample::SampleImage;
}
