//! Execution backends.
//!
//! Four interchangeable ways of running the same filter:
//!
//! ```text
//! Backend::Reference       ReferenceBackend   scalar loops
//! Backend::CompiledCpu     CpuBackend         row-parallel schedules (rayon)
//! Backend::CompiledGpu     WgpuBackend        compute shaders (feature "wgpu")
//! Backend::ParallelCompute WorkGroupBackend   explicit work-group dispatch
//! ```
//!
//! All of them implement [`FilterBackend`], so [`NativeProcessor`](crate::NativeProcessor)
//! dispatches through one signature.

mod cpu_backend;
mod detect;
mod reference;
mod workgroup;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_backend::{CpuBackend, CpuLimits};
pub use detect::{BackendInfo, describe_backends, detect_backends, gpu_adapters};
pub use reference::ReferenceBackend;
pub use workgroup::{MAX_WORK_GROUP_INVOCATIONS, Tile, WorkGroupBackend, generate_tiles};

#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuBackend;

use std::fmt;
use std::str::FromStr;

use fxlab_core::RgbaImage;

use crate::{ComputeResult, Filter, WorkGroupShape};

/// Execution strategy for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Plain scalar loops. Ground truth for verification.
    #[default]
    Reference,
    /// Row-parallel CPU schedules.
    CompiledCpu,
    /// wgpu compute shaders (Vulkan/Metal/DX12).
    CompiledGpu,
    /// Hand-written work-group dispatch with configurable local size.
    ParallelCompute,
}

impl Backend {
    /// All backends in menu order.
    pub const fn all() -> &'static [Self] {
        &[
            Self::Reference,
            Self::CompiledCpu,
            Self::CompiledGpu,
            Self::ParallelCompute,
        ]
    }

    /// Canonical name, as accepted on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::CompiledCpu => "halide_cpu",
            Self::CompiledGpu => "halide_gpu",
            Self::ParallelCompute => "opencl",
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reference => "Reference",
            Self::CompiledCpu => "Compiled CPU",
            Self::CompiledGpu => "Compiled GPU",
            Self::ParallelCompute => "Parallel compute",
        }
    }

    /// Alternative names accepted by [`FromStr`].
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Reference => &["ref"],
            Self::CompiledCpu => &["compiled_cpu", "cpu"],
            Self::CompiledGpu => &["compiled_gpu", "gpu", "wgpu"],
            Self::ParallelCompute => &["parallel_compute", "parallel", "workgroup"],
        }
    }

    /// Whether this backend can run in the current build on this machine.
    pub fn is_available(self) -> bool {
        match self {
            Self::Reference | Self::CompiledCpu | Self::ParallelCompute => true,
            #[cfg(feature = "wgpu")]
            Self::CompiledGpu => WgpuBackend::is_available(),
            #[cfg(not(feature = "wgpu"))]
            Self::CompiledGpu => false,
        }
    }

    /// Whether the work-group shape setting affects this backend.
    pub const fn uses_work_groups(self) -> bool {
        matches!(self, Self::CompiledGpu | Self::ParallelCompute)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|b| {
                b.name().eq_ignore_ascii_case(s)
                    || b.aliases().iter().any(|a| a.eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| {
                let names: Vec<_> = Self::all().iter().map(|b| b.name()).collect();
                format!("unknown backend '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// One filter pass on a concrete backend.
pub trait FilterBackend {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Runs `filter` over `input` into `output` once.
    ///
    /// `output` has the same dimensions as `input`. `shape` is the explicit
    /// work-group shape, ignored by backends without work-groups.
    fn execute(
        &mut self,
        filter: Filter,
        input: &RgbaImage,
        output: &mut RgbaImage,
        shape: Option<WorkGroupShape>,
    ) -> ComputeResult<()>;
}
