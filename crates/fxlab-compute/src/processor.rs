//! Native processor: the production [`ProcessingBoundary`].
//!
//! Owns one instance of every backend plus the reference cache, and runs the
//! common protocol around each backend pass: warm-up, timed iterations,
//! verification against the cached reference, timing report.

use std::time::Instant;

use fxlab_core::RgbaImage;
use tracing::{debug, info};

use crate::backend::{CpuBackend, FilterBackend, ReferenceBackend, WorkGroupBackend};
#[cfg(feature = "wgpu")]
use crate::backend::WgpuBackend;
use crate::cache::{CacheStats, ReferenceCache};
use crate::verify::{self, TOLERANCE};
use crate::{
    Backend, ComputeError, ComputeResult, Filter, ProcessingBoundary, StatusReporter, Verdict,
    WorkGroupShape,
};

/// Default number of timed iterations.
pub const DEFAULT_ITERATIONS: u32 = 8;

/// Settings applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    /// Compare non-reference output against the reference.
    pub verify: bool,
    /// Timed iterations after the warm-up pass.
    pub iterations: u32,
    /// Explicit work-group shape; `None` lets the backend choose.
    pub work_group: Option<WorkGroupShape>,
    /// GPU adapter index (see [`gpu_adapters`](crate::gpu_adapters));
    /// `None` picks the high-performance adapter.
    pub gpu_adapter: Option<usize>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            verify: true,
            iterations: DEFAULT_ITERATIONS,
            work_group: None,
            gpu_adapter: None,
        }
    }
}

/// Runs filters on the native backends.
pub struct NativeProcessor {
    params: RunParams,
    cache: ReferenceCache,
    reference: ReferenceBackend,
    cpu: CpuBackend,
    parallel: WorkGroupBackend,
    #[cfg(feature = "wgpu")]
    gpu: Option<WgpuBackend>,
}

impl NativeProcessor {
    pub fn new() -> Self {
        Self::with_params(RunParams::default())
    }

    pub fn with_params(params: RunParams) -> Self {
        Self {
            params: RunParams {
                iterations: params.iterations.max(1),
                ..params
            },
            cache: ReferenceCache::new(),
            reference: ReferenceBackend::new(),
            cpu: CpuBackend::new(),
            parallel: WorkGroupBackend::new(),
            #[cfg(feature = "wgpu")]
            gpu: None,
        }
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Selects the GPU adapter for later compiled GPU runs. A device already
    /// created on another adapter is dropped.
    pub fn set_gpu_adapter(&mut self, index: Option<usize>) {
        if self.params.gpu_adapter == index {
            return;
        }
        debug!(?index, "gpu adapter selected");
        self.params.gpu_adapter = index;
        #[cfg(feature = "wgpu")]
        {
            self.gpu = None;
        }
    }

    /// Reference cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Backend for a timed pass. The GPU device is created on first use.
    fn executor(&mut self, backend: Backend) -> ComputeResult<&mut dyn FilterBackend> {
        match backend {
            Backend::Reference => Ok(&mut self.reference),
            Backend::CompiledCpu => Ok(&mut self.cpu),
            Backend::ParallelCompute => Ok(&mut self.parallel),
            Backend::CompiledGpu => {
                #[cfg(feature = "wgpu")]
                {
                    if self.gpu.is_none() {
                        let gpu = WgpuBackend::with_adapter(self.params.gpu_adapter)?;
                        debug!(adapter = gpu.adapter_name(), "gpu backend created");
                        self.gpu = Some(gpu);
                    }
                    match self.gpu.as_mut() {
                        Some(gpu) => Ok(gpu),
                        None => Err(ComputeError::NoAdapter),
                    }
                }
                #[cfg(not(feature = "wgpu"))]
                {
                    Err(ComputeError::BackendNotAvailable(
                        "wgpu feature not enabled".to_string(),
                    ))
                }
            }
        }
    }

    /// Reference run: served from the cache when possible.
    fn run_reference(
        &mut self,
        filter: Filter,
        input: &RgbaImage,
        output: &mut RgbaImage,
        status: &mut StatusReporter<'_>,
    ) -> ComputeResult<()> {
        if let Some(cached) = self.cache.get(filter, input.dimensions()) {
            output.copy_from(cached)?;
            status.report("Finished reference (cached)");
            return Ok(());
        }

        status.report("Running reference");
        self.reference.execute(filter, input, output, None)?;
        status.report("Finished reference");
        self.cache.insert(filter, output.clone());
        Ok(())
    }

    /// Makes sure the cache holds the reference output for `filter`.
    fn ensure_reference(
        &mut self,
        filter: Filter,
        input: &RgbaImage,
        status: &mut StatusReporter<'_>,
    ) -> ComputeResult<()> {
        if self.cache.get(filter, input.dimensions()).is_some() {
            return Ok(());
        }
        let mut reference = input.blank_like();
        self.run_reference(filter, input, &mut reference, status)
    }

    fn verify(
        &mut self,
        filter: Filter,
        input: &RgbaImage,
        output: &RgbaImage,
        status: &mut StatusReporter<'_>,
    ) -> ComputeResult<bool> {
        self.ensure_reference(filter, input, status)?;
        let reference = self
            .cache
            .peek(filter, input.dimensions())
            .ok_or_else(|| ComputeError::OperationFailed("reference missing".into()))?;
        let errors = verify::compare(reference, output, TOLERANCE, status)?;
        debug!(%filter, errors, "verified");
        Ok(errors == 0)
    }

    /// Warm-up plus timed iterations on a non-reference backend.
    fn run_timed(
        &mut self,
        filter: Filter,
        backend: Backend,
        input: &RgbaImage,
        output: &mut RgbaImage,
        status: &mut StatusReporter<'_>,
    ) -> ComputeResult<f64> {
        let iterations = self.params.iterations;
        let shape = if backend.uses_work_groups() {
            self.params.work_group
        } else {
            None
        };

        let exec = self.executor(backend)?;
        status.report(running_message(backend));

        exec.execute(filter, input, output, shape)?;
        let start = Instant::now();
        for _ in 0..iterations {
            exec.execute(filter, input, output, shape)?;
        }
        let avg = verify::average_ms(start.elapsed(), iterations);

        if backend == Backend::ParallelCompute {
            status.report("Finished parallel compute kernel");
        }
        Ok(avg)
    }
}

impl Default for NativeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn running_message(backend: Backend) -> &'static str {
    match backend {
        Backend::Reference => "Running reference",
        Backend::CompiledCpu => "Running compiled CPU filter",
        Backend::CompiledGpu => "Running compiled GPU filter",
        Backend::ParallelCompute => "Running parallel compute kernel",
    }
}

impl ProcessingBoundary for NativeProcessor {
    fn list_filters(&self) -> Vec<String> {
        Filter::all().iter().map(|f| f.name().to_string()).collect()
    }

    fn run(
        &mut self,
        input: &RgbaImage,
        output: &mut RgbaImage,
        filter_index: usize,
        backend: Backend,
        status: &mut StatusReporter<'_>,
    ) -> ComputeResult<Verdict> {
        let filter = Filter::from_index(filter_index)?;
        input.ensure_same_dimensions(output)?;
        info!(%filter, %backend, width = input.width(), height = input.height(), "run");

        if backend == Backend::Reference {
            self.run_reference(filter, input, output, status)?;
            return Ok(Verdict::Pass);
        }

        let avg_ms = self.run_timed(filter, backend, input, output, status)?;
        let verified = if self.params.verify {
            Some(self.verify(filter, input, output, status)?)
        } else {
            None
        };
        status.report(verify::finish_message(avg_ms, verified));

        Ok(Verdict::from(verified.unwrap_or(true)))
    }

    fn set_verification_enabled(&mut self, enabled: bool) {
        self.params.verify = enabled;
    }

    fn verification_enabled(&self) -> bool {
        self.params.verify
    }

    fn set_work_group_shape(&mut self, x: u32, y: u32) {
        self.params.work_group = WorkGroupShape::new(x, y);
    }

    fn work_group_shape(&self) -> Option<WorkGroupShape> {
        self.params.work_group
    }

    fn set_iterations(&mut self, iterations: u32) {
        self.params.iterations = iterations.max(1);
    }

    fn iterations(&self) -> u32 {
        self.params.iterations
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
        debug!(clears = self.cache.stats().clears, "reference cache cleared");
    }
}
