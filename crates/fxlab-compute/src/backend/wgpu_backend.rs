//! wgpu backend implementation.
//!
//! Compiled GPU filters as WGSL compute shaders. The work-group shape is fed
//! to the shader through `WG_X`/`WG_Y` pipeline override constants, so one
//! pipeline is built per (filter, shape) pair and cached.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use fxlab_core::RgbaImage;
use tracing::{debug, trace};
use wgpu::util::DeviceExt;

use super::FilterBackend;
use crate::shaders;
use crate::{ComputeError, ComputeResult, Filter, WorkGroupShape};

/// Local size used when none is configured.
const DEFAULT_LOCAL_SIZE: WorkGroupShape = WorkGroupShape { x: 8, y: 8 };

/// Dimensions uniform: [width, height, 0, 0]
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

/// Compute limits relevant to work-group validation.
#[derive(Debug, Clone, Copy)]
struct ComputeLimits {
    max_invocations: u32,
    max_size_x: u32,
    max_size_y: u32,
    max_groups_per_dim: u32,
    max_buffer_bytes: u64,
}

fn instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// wgpu GPU backend.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    limits: ComputeLimits,
    adapter_name: String,
    pipelines: HashMap<(Filter, u32, u32), wgpu::ComputePipeline>,
}

impl WgpuBackend {
    /// Check if a wgpu adapter is available.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            instance()
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Names of every adapter, in the order used by
    /// [`with_adapter`](Self::with_adapter).
    pub fn adapters() -> Vec<String> {
        instance()
            .enumerate_adapters(wgpu::Backends::all())
            .iter()
            .map(|adapter| {
                let info = adapter.get_info();
                format!("{} ({:?})", info.name, info.backend)
            })
            .collect()
    }

    /// Create a new backend on the best adapter.
    pub fn new() -> ComputeResult<Self> {
        Self::with_adapter(None)
    }

    /// Create a new backend on adapter `index`, or the best adapter when
    /// `None`.
    pub fn with_adapter(index: Option<usize>) -> ComputeResult<Self> {
        pollster::block_on(Self::new_async(index))
    }

    pub async fn new_async(index: Option<usize>) -> ComputeResult<Self> {
        let instance = instance();

        let adapter = match index {
            Some(i) => {
                let adapters = instance.enumerate_adapters(wgpu::Backends::all());
                let count = adapters.len();
                adapters.into_iter().nth(i).ok_or_else(|| {
                    ComputeError::BackendNotAvailable(format!(
                        "GPU adapter {i} not found ({count} available)"
                    ))
                })?
            }
            None => instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok_or(ComputeError::NoAdapter)?,
        };

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("fxlab_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        let info = adapter.get_info();
        debug!(adapter = %info.name, backend = ?info.backend, "wgpu device ready");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            limits: ComputeLimits {
                max_invocations: adapter_limits.max_compute_invocations_per_workgroup,
                max_size_x: adapter_limits.max_compute_workgroup_size_x,
                max_size_y: adapter_limits.max_compute_workgroup_size_y,
                max_groups_per_dim: adapter_limits.max_compute_workgroups_per_dimension,
                max_buffer_bytes: adapter_limits.max_buffer_size,
            },
            adapter_name: info.name,
            pipelines: HashMap::new(),
        })
    }

    /// Adapter name as reported by the driver.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn validate(&self, shape: WorkGroupShape, width: u32, height: u32) -> ComputeResult<()> {
        let invalid = |reason: String| ComputeError::InvalidWorkGroup {
            x: shape.x,
            y: shape.y,
            reason,
        };
        if shape.invocations() > self.limits.max_invocations as u64 {
            return Err(invalid(format!(
                "{} work-items exceeds the device limit of {}",
                shape.invocations(),
                self.limits.max_invocations
            )));
        }
        if shape.x > self.limits.max_size_x || shape.y > self.limits.max_size_y {
            return Err(invalid(format!(
                "device allows at most {}x{}",
                self.limits.max_size_x, self.limits.max_size_y
            )));
        }
        let groups = width.div_ceil(shape.x).max(height.div_ceil(shape.y));
        if groups > self.limits.max_groups_per_dim {
            return Err(invalid(format!(
                "{groups} groups per dimension exceeds the device limit of {}",
                self.limits.max_groups_per_dim
            )));
        }
        Ok(())
    }

    fn ensure_pipeline(&mut self, filter: Filter, shape: WorkGroupShape) -> ComputeResult<()> {
        let key = (filter, shape.x, shape.y);
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }
        trace!(%filter, local = %shape, "building pipeline");

        let constants = HashMap::from([
            ("WG_X".to_string(), shape.x as f64),
            ("WG_Y".to_string(), shape.y as f64),
        ]);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(filter.name()),
            source: wgpu::ShaderSource::Wgsl(shaders::source(filter).into()),
        });
        let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(filter.name()),
            layout: None, // Auto layout
            module: &module,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                ..Default::default()
            },
            cache: None,
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::OperationFailed(format!(
                "pipeline creation for {filter} failed: {err}"
            )));
        }

        self.pipelines.insert(key, pipeline);
        Ok(())
    }

    /// Copy a storage buffer back into `dst`.
    fn download(&self, buffer: &wgpu::Buffer, dst: &mut [u8]) -> ComputeResult<()> {
        let size = dst.len() as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("Map channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("Map failed: {e}")))?;

        {
            let data = slice.get_mapped_range();
            dst.copy_from_slice(&data);
        }
        staging.unmap();
        Ok(())
    }
}

impl FilterBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "halide_gpu"
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
        if input.size_bytes() as u64 > self.limits.max_buffer_bytes {
            return Err(ComputeError::OperationFailed(format!(
                "{w}x{h} image exceeds the device buffer limit of {} bytes",
                self.limits.max_buffer_bytes
            )));
        }

        let local = shape.unwrap_or(DEFAULT_LOCAL_SIZE);
        self.validate(local, w, h)?;
        self.ensure_pipeline(filter, local)?;
        let pipeline = self
            .pipelines
            .get(&(filter, local.x, local.y))
            .ok_or_else(|| ComputeError::OperationFailed("pipeline missing".into()))?;

        let src = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("src_buffer"),
            contents: input.data(),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let dst = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dst_buffer"),
            size: output.size_bytes() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let dims = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dims_uniform"),
            contents: bytemuck::bytes_of(&DimsUniform { dims: [w, h, 0, 0] }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let layout = pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("filter_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: src.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: dst.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: dims.as_entire_binding() },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("compute_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(w.div_ceil(local.x), h.div_ceil(local.y), 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);

        self.download(&dst, output.data_mut())
    }
}
