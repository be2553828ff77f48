//! Filter library and execution backends for the fxlab harness.
//!
//! Provides five image filters that can each run on four interchangeable
//! backends, plus verification of backend output against the scalar
//! reference.
//!
//! # Architecture
//!
//! ```text
//! ProcessingBoundary (uniform contract used by the harness)
//!     └── NativeProcessor
//!             ├── Backend::Reference       scalar loops, cached per filter
//!             ├── Backend::CompiledCpu     row-parallel schedules (rayon)
//!             ├── Backend::CompiledGpu     wgpu compute shaders (feature "wgpu")
//!             └── Backend::ParallelCompute work-group dispatch (rayon)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fxlab_compute::{Backend, NativeProcessor, ProcessingBoundary, StatusReporter};
//! use fxlab_core::SampleImage;
//!
//! let mut proc = NativeProcessor::new();
//! let input = SampleImage::Baboon.render(512, 512)?;
//! let mut output = input.blank_like();
//! let mut log = |msg: String| println!("{msg}");
//! let verdict = proc.run(&input, &mut output, 2, Backend::CompiledCpu,
//!                        &mut StatusReporter::new(&mut log))?;
//! ```

pub mod backend;
pub mod boundary;
pub mod cache;
pub mod filters;
pub mod processor;
pub mod verify;
mod shaders;

pub use backend::{
    Backend, BackendInfo, FilterBackend, describe_backends, detect_backends, gpu_adapters,
};
pub use boundary::{ProcessingBoundary, StatusReporter, Verdict, WorkGroupShape};
pub use cache::{CacheStats, ReferenceCache};
pub use filters::Filter;
pub use processor::{NativeProcessor, RunParams};

use thiserror::Error;

/// Errors raised when a backend cannot execute a filter at all.
///
/// These are hard failures, reported separately from a verification
/// mismatch (which is a [`Verdict::Fail`], not an error).
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    #[error("Filter index {index} out of range ({count} filters)")]
    InvalidFilter { index: usize, count: usize },

    #[error("Invalid work-group size {x}x{y}: {reason}")]
    InvalidWorkGroup { x: u32, y: u32, reason: String },

    #[error("Image error: {0}")]
    Image(#[from] fxlab_core::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

pub type ComputeResult<T> = Result<T, ComputeError>;
