//! Work-group dispatch backend.
//!
//! Mimics an OpenCL-style NDRange launch on CPU threads: the image is cut
//! into work-groups of the local size, groups run in parallel on the rayon
//! pool, and each work-item inside a group computes exactly one output pixel
//! with the scalar kernel. Output is bit-identical to the reference.
//!
//! An explicit local size must evenly divide the global size, as in
//! OpenCL 1.x. With no explicit size, [`DEFAULT_LOCAL_SIZE`] is used and the
//! last row/column of groups may be partial.

use rayon::prelude::*;

use fxlab_core::RgbaImage;
use fxlab_core::image::CHANNELS;
use tracing::trace;

use super::FilterBackend;
use crate::{ComputeError, ComputeResult, Filter, WorkGroupShape};

/// Maximum work-items per group.
pub const MAX_WORK_GROUP_INVOCATIONS: u64 = 1024;

/// Local size used when none is configured.
pub const DEFAULT_LOCAL_SIZE: WorkGroupShape = WorkGroupShape { x: 16, y: 16 };

/// Rectangle of pixels covered by one work-group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X offset in the image.
    pub x: u32,
    /// Y offset in the image.
    pub y: u32,
    /// Tile width.
    pub width: u32,
    /// Tile height.
    pub height: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Cuts a `width` x `height` image into tiles of the given shape, row-major.
/// Tiles on the right and bottom edges are clipped.
pub fn generate_tiles(width: u32, height: u32, shape: WorkGroupShape) -> Vec<Tile> {
    let mut tiles = Vec::new();

    let mut y = 0;
    while y < height {
        let th = shape.y.min(height - y);
        let mut x = 0;
        while x < width {
            let tw = shape.x.min(width - x);
            tiles.push(Tile::new(x, y, tw, th));
            x += shape.x;
        }
        y += shape.y;
    }

    tiles
}

/// CPU work-group dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct WorkGroupBackend {
    default_shape: WorkGroupShape,
}

impl WorkGroupBackend {
    pub fn new() -> Self {
        Self {
            default_shape: DEFAULT_LOCAL_SIZE,
        }
    }

    /// Checks an explicit local size against the device limit and the
    /// global size.
    pub fn validate(shape: WorkGroupShape, width: u32, height: u32) -> ComputeResult<()> {
        let invalid = |reason: String| ComputeError::InvalidWorkGroup {
            x: shape.x,
            y: shape.y,
            reason,
        };
        if shape.invocations() > MAX_WORK_GROUP_INVOCATIONS {
            return Err(invalid(format!(
                "{} work-items exceeds the limit of {}",
                shape.invocations(),
                MAX_WORK_GROUP_INVOCATIONS
            )));
        }
        if width % shape.x != 0 || height % shape.y != 0 {
            return Err(invalid(format!(
                "does not evenly divide the {width}x{height} global size"
            )));
        }
        Ok(())
    }

    /// Local size that would be used for `shape`.
    pub fn resolve(&self, shape: Option<WorkGroupShape>) -> WorkGroupShape {
        shape.unwrap_or(self.default_shape)
    }
}

impl Default for WorkGroupBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBackend for WorkGroupBackend {
    fn name(&self) -> &'static str {
        "opencl"
    }

    fn execute(
        &mut self,
        filter: Filter,
        input: &RgbaImage,
        output: &mut RgbaImage,
        shape: Option<WorkGroupShape>,
    ) -> ComputeResult<()> {
        input.ensure_same_dimensions(output)?;
        let (w, h) = input.dimensions();
        if let Some(explicit) = shape {
            Self::validate(explicit, w, h)?;
        }
        let local = self.resolve(shape);
        let tiles = generate_tiles(w, h, local);
        trace!(%filter, local = %local, groups = tiles.len(), "dispatch");

        // Each group computes into its own local buffer.
        let results: Vec<(Tile, Vec<u8>)> = tiles
            .into_par_iter()
            .map(|tile| {
                let mut local_out = Vec::with_capacity(tile.pixel_count() * CHANNELS);
                for ly in 0..tile.height {
                    for lx in 0..tile.width {
                        local_out.extend_from_slice(&filter.kernel(
                            input,
                            tile.x + lx,
                            tile.y + ly,
                        ));
                    }
                }
                (tile, local_out)
            })
            .collect();

        let stride = output.stride();
        let dst = output.data_mut();
        for (tile, pixels) in results {
            let row_bytes = tile.width as usize * CHANNELS;
            for (ly, src_row) in pixels.chunks_exact(row_bytes).enumerate() {
                let start = (tile.y as usize + ly) * stride + tile.x as usize * CHANNELS;
                dst[start..start + row_bytes].copy_from_slice(src_row);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ReferenceBackend;
    use fxlab_core::SampleImage;

    fn shape(x: u32, y: u32) -> WorkGroupShape {
        WorkGroupShape::new(x, y).unwrap()
    }

    #[test]
    fn test_generate_tiles() {
        let tiles = generate_tiles(40, 20, shape(16, 16));
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[0], Tile::new(0, 0, 16, 16));
        assert_eq!(tiles[2], Tile::new(32, 0, 8, 16));
        assert_eq!(tiles[5], Tile::new(32, 16, 8, 4));
        let covered: usize = tiles.iter().map(Tile::pixel_count).sum();
        assert_eq!(covered, 40 * 20);
    }

    #[test]
    fn matches_reference_exactly() {
        let input = SampleImage::Doughnuts.render(32, 24).unwrap();
        for &filter in Filter::all() {
            let mut expected = input.blank_like();
            ReferenceBackend::new()
                .execute(filter, &input, &mut expected, None)
                .unwrap();

            let mut out = input.blank_like();
            WorkGroupBackend::new()
                .execute(filter, &input, &mut out, Some(shape(8, 4)))
                .unwrap();
            assert_eq!(out, expected, "{filter}");
        }
    }

    #[test]
    fn default_shape_handles_partial_groups() {
        let input = SampleImage::Lena.render(37, 23).unwrap();
        let mut out = input.blank_like();
        WorkGroupBackend::new()
            .execute(Filter::Copy, &input, &mut out, None)
            .unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn rejects_oversized_group() {
        let err = WorkGroupBackend::validate(shape(64, 32), 512, 512).unwrap_err();
        assert!(matches!(err, ComputeError::InvalidWorkGroup { x: 64, y: 32, .. }));
    }

    #[test]
    fn rejects_non_dividing_group() {
        assert!(WorkGroupBackend::validate(shape(16, 16), 40, 32).is_err());
        assert!(WorkGroupBackend::validate(shape(8, 16), 40, 32).is_ok());
    }
}
