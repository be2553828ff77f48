//! Compiled CPU backend using rayon for parallelization.

use fxlab_core::RgbaImage;
use tracing::trace;

use super::FilterBackend;
use crate::filters::schedule;
use crate::{ComputeError, ComputeResult, Filter, WorkGroupShape};

/// Fallback when system memory cannot be queried.
const DEFAULT_AVAILABLE_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Intermediate planes allocated per pass, in units of the RGBA8 image size.
/// The separable blur keeps an RGB f32 plane (3 x 4 bytes per pixel).
const WORKING_SET_FACTOR: u64 = 4;

/// Host memory limits for CPU processing.
#[derive(Debug, Clone, Copy)]
pub struct CpuLimits {
    /// Available system memory in bytes.
    pub available_memory: u64,
    /// Worker threads in the rayon pool.
    pub threads: usize,
}

impl CpuLimits {
    pub fn detect() -> Self {
        let available_memory = sys_info::mem_info()
            .map(|m| m.avail * 1024)
            .unwrap_or(DEFAULT_AVAILABLE_BYTES);
        Self {
            available_memory,
            threads: rayon::current_num_threads(),
        }
    }

    /// Bytes a pass over a `width` x `height` image may allocate.
    pub fn estimate_memory(width: u32, height: u32) -> u64 {
        width as u64 * height as u64 * 4 * WORKING_SET_FACTOR
    }

    pub fn fits_memory(&self, width: u32, height: u32) -> bool {
        Self::estimate_memory(width, height) <= self.available_memory
    }
}

/// Row-parallel compiled schedules.
pub struct CpuBackend {
    limits: CpuLimits,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            limits: CpuLimits::detect(),
        }
    }

    pub fn with_limits(limits: CpuLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &CpuLimits {
        &self.limits
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "halide_cpu"
    }

    fn execute(
        &mut self,
        filter: Filter,
        input: &RgbaImage,
        output: &mut RgbaImage,
        _shape: Option<WorkGroupShape>,
    ) -> ComputeResult<()> {
        input.ensure_same_dimensions(output)?;
        let (w, h) = input.dimensions();
        if !self.limits.fits_memory(w, h) {
            return Err(ComputeError::OperationFailed(format!(
                "{}x{} image needs {} bytes, {} available",
                w,
                h,
                CpuLimits::estimate_memory(w, h),
                self.limits.available_memory
            )));
        }
        trace!(%filter, threads = self.limits.threads, "cpu pass");
        schedule::run(filter, input, output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_some_memory() {
        let limits = CpuLimits::detect();
        assert!(limits.available_memory > 0);
        assert!(limits.threads >= 1);
    }

    #[test]
    fn refuses_when_memory_short() {
        let mut cpu = CpuBackend::with_limits(CpuLimits {
            available_memory: 16,
            threads: 1,
        });
        let input = RgbaImage::new(8, 8).unwrap();
        let mut out = input.blank_like();
        let err = cpu.execute(Filter::Copy, &input, &mut out, None).unwrap_err();
        assert!(matches!(err, ComputeError::OperationFailed(_)));
    }
}
