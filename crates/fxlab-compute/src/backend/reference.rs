//! Scalar reference backend.

use fxlab_core::RgbaImage;

use super::FilterBackend;
use crate::{ComputeResult, Filter, WorkGroupShape};

/// Plain nested loops over every pixel, no parallelism.
///
/// Slow on purpose: its output defines what every other backend is verified
/// against.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceBackend;

impl ReferenceBackend {
    pub fn new() -> Self {
        Self
    }
}

impl FilterBackend for ReferenceBackend {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn execute(
        &mut self,
        filter: Filter,
        input: &RgbaImage,
        output: &mut RgbaImage,
        _shape: Option<WorkGroupShape>,
    ) -> ComputeResult<()> {
        input.ensure_same_dimensions(output)?;
        for y in 0..input.height() {
            for x in 0..input.width() {
                output.put_pixel(x, y, filter.kernel(input, x, y));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComputeError;

    #[test]
    fn copy_reproduces_input() {
        let input = fxlab_core::SampleImage::Peppers.render(9, 7).unwrap();
        let mut out = input.blank_like();
        ReferenceBackend::new()
            .execute(Filter::Copy, &input, &mut out, None)
            .unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn rejects_mismatched_output() {
        let input = RgbaImage::new(4, 4).unwrap();
        let mut out = RgbaImage::new(4, 5).unwrap();
        let err = ReferenceBackend::new()
            .execute(Filter::Blur, &input, &mut out, None)
            .unwrap_err();
        assert!(matches!(err, ComputeError::Image(_)));
    }
}
