//! Error types for fxlab-core operations.
//!
//! The [`Error`] enum covers failures that can occur while building image
//! buffers or resolving names supplied by a user:
//! - Buffer construction (zero or overflowing dimensions, wrong data length)
//! - Dimension checks between paired buffers
//! - Sample image lookup by name
//!
//! # Usage
//!
//! ```rust
//! use fxlab_core::{Error, RgbaImage};
//!
//! let err = RgbaImage::new(0, 16).unwrap_err();
//! assert!(matches!(err, Error::InvalidDimensions { .. }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or pairing image buffers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Width or height is zero, or the byte size overflows `usize`.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Raw pixel data does not match `width * height * 4`.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// Expected byte count
        expected: usize,
        /// Actual byte count
        actual: usize,
    },

    /// Two buffers that must share dimensions do not.
    ///
    /// Returned when an output buffer does not match its input, for example
    /// when a processing call is handed buffers from two different images.
    #[error("dimension mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        /// Expected (width, height)
        expected: (u32, u32),
        /// Actual (width, height)
        actual: (u32, u32),
    },

    /// No sample image with the given name exists.
    #[error("unknown sample image '{0}'")]
    UnknownSample(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_message() {
        let err = Error::DimensionMismatch {
            expected: (512, 512),
            actual: (256, 128),
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 512x512, got 256x128");
    }

    #[test]
    fn unknown_sample_message() {
        let err = Error::UnknownSample("mandrill".into());
        assert!(err.to_string().contains("mandrill"));
    }
}
