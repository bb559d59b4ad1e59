//! GPU grid evaluator
//!
//! Re-expresses the CPU evaluation as a wgpu compute kernel dispatched
//! with one workgroup per cell over the full `(g, g, g)` index space and
//! `@workgroup_size(24)` — one invocation per (cell, tetra, slot) tuple.
//! Each invocation derives its own corner world position from scratch
//! (no dependency on sibling invocations) and writes one sign and one
//! position into flat output buffers with the [`TetraStream`] layout.
//!
//! The kernel mirrors the host-side corner enumeration as a literal
//! array and reads the tetrahedron-to-corner map from a lookup buffer
//! uploaded from [`TETRA_TO_CORNER`], so host and device cannot drift
//! apart independently.
//!
//! Buffers are owned by the [`GpuExtractor`]: allocated once at
//! construction, sized exactly from `grid_size`, released exactly once
//! on drop. A `grid_size` change means constructing a new extractor,
//! never resizing in place.

use glam::Vec3;
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::field::WgslField;
use crate::grid::GridConfig;
use crate::stream::TetraStream;
use crate::tables::{CORNER_OFFSETS, TETRA_TO_CORNER};

/// Error type for GPU evaluation.
///
/// Every variant is fatal to the current grid build; the extractor never
/// falls back to the CPU path on its own. Retrying on the CPU is a
/// caller decision on a fresh build.
#[derive(Error, Debug)]
pub enum GpuError {
    /// No compatible GPU adapter was found
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to create the GPU device
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(String),

    /// The grid configuration was rejected before allocation
    #[error("invalid grid configuration: {0}")]
    InvalidConfig(String),

    /// Evaluate was called with a differently sized grid than the
    /// extractor's buffers were allocated for
    #[error("grid size mismatch: buffers sized for {allocated}, config has {requested}")]
    GridSizeMismatch {
        /// Grid size the buffers were allocated for
        allocated: usize,
        /// Grid size of the rejected configuration
        requested: usize,
    },

    /// Reading a result buffer back from the device failed
    #[error("buffer mapping error: {0}")]
    BufferMapping(String),
}

/// Uniforms shared with the kernel (48 bytes, 16-byte aligned).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GridUniforms {
    origin: [f32; 4],
    rotation: [f32; 4],
    grid_size: u32,
    cell_size: f32,
    _pad0: u32,
    _pad1: u32,
}

impl GridUniforms {
    fn from_config(config: &GridConfig) -> Self {
        GridUniforms {
            origin: [config.origin.x, config.origin.y, config.origin.z, 0.0],
            rotation: config.rotation.to_array(),
            grid_size: config.grid_size as u32,
            cell_size: config.cell_size,
            _pad0: 0,
            _pad1: 0,
        }
    }
}

/// GPU-resident grid evaluator.
///
/// Holds the device, the compiled kernel and the grid-lifetime buffers.
/// Construction performs all allocation; [`evaluate`](Self::evaluate)
/// is then a single dispatch-then-readback round trip per build.
pub struct GpuExtractor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    sign_buffer: wgpu::Buffer,
    position_buffer: wgpu::Buffer,
    sign_staging: wgpu::Buffer,
    position_staging: wgpu::Buffer,
    grid_size: usize,
}

impl GpuExtractor {
    /// Create an extractor for the given grid size and field.
    ///
    /// Compiles the evaluation kernel with the field's WGSL body spliced
    /// in and allocates the sign, position and tetra-lookup buffers,
    /// sized exactly `grid_size³ * 24` elements.
    pub fn new<F: WgslField>(config: &GridConfig, field: &F) -> Result<Self, GpuError> {
        config
            .validate()
            .map_err(|e| GpuError::InvalidConfig(e.to_string()))?;

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tetramarch device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        let shader_source = kernel_source(field);
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tetramarch eval kernel"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tetramarch bind group layout"),
            entries: &[
                bgl_entry(0, wgpu::BufferBindingType::Uniform),
                bgl_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                bgl_entry(2, wgpu::BufferBindingType::Storage { read_only: false }),
                bgl_entry(3, wgpu::BufferBindingType::Storage { read_only: false }),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tetramarch pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("tetramarch eval pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let slot_count = config.slot_count();
        let sign_size = (slot_count * std::mem::size_of::<u32>()) as u64;
        let position_size = (slot_count * std::mem::size_of::<[f32; 4]>()) as u64;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tetramarch uniforms"),
            size: std::mem::size_of::<GridUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // the kernel reads the tetra map from this buffer, so it is the
        // same constant the CPU evaluator walks
        let tetra_map: Vec<u32> = TETRA_TO_CORNER
            .iter()
            .flatten()
            .map(|&c| c as u32)
            .collect();
        let tetra_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("tetramarch tetra-to-corner lookup"),
            contents: bytemuck::cast_slice(&tetra_map),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let sign_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tetramarch sign buffer"),
            size: sign_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let position_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tetramarch position buffer"),
            size: position_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let sign_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tetramarch sign staging"),
            size: sign_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let position_staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tetramarch position staging"),
            size: position_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tetramarch bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: tetra_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: sign_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: position_buffer.as_entire_binding(),
                },
            ],
        });

        Ok(GpuExtractor {
            device,
            queue,
            pipeline,
            bind_group,
            uniform_buffer,
            sign_buffer,
            position_buffer,
            sign_staging,
            position_staging,
            grid_size: config.grid_size,
        })
    }

    /// Grid size the extractor's buffers were allocated for.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Evaluate the field over the grid on the GPU.
    ///
    /// One synchronous round trip: write uniforms, dispatch `(g, g, g)`
    /// workgroups, then block on a full readback of both output buffers.
    /// No streaming, no partial readback, no mid-dispatch cancellation.
    /// A config whose `grid_size` differs from the allocated one is a
    /// fatal mismatch, not a resize.
    pub fn evaluate(&self, config: &GridConfig) -> Result<TetraStream, GpuError> {
        if config.grid_size != self.grid_size {
            return Err(GpuError::GridSizeMismatch {
                allocated: self.grid_size,
                requested: config.grid_size,
            });
        }

        let uniforms = GridUniforms::from_config(config);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tetramarch eval encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tetramarch eval pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            let g = self.grid_size as u32;
            pass.dispatch_workgroups(g, g, g);
        }

        encoder.copy_buffer_to_buffer(
            &self.sign_buffer,
            0,
            &self.sign_staging,
            0,
            self.sign_buffer.size(),
        );
        encoder.copy_buffer_to_buffer(
            &self.position_buffer,
            0,
            &self.position_staging,
            0,
            self.position_buffer.size(),
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let slot_count = config.slot_count();
        let raw_signs: Vec<u32> = read_back(&self.device, &self.sign_staging, slot_count)?;
        let raw_positions: Vec<[f32; 4]> =
            read_back(&self.device, &self.position_staging, slot_count)?;

        Ok(TetraStream {
            grid_size: self.grid_size,
            signs: raw_signs.into_iter().map(|s| s != 0).collect(),
            positions: raw_positions
                .into_iter()
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect(),
        })
    }
}

impl std::fmt::Debug for GpuExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuExtractor")
            .field("grid_size", &self.grid_size)
            .finish()
    }
}

/// Generate the WGSL evaluation kernel for a field.
///
/// The corner offsets are emitted as a literal array that must stay in
/// lockstep with [`CORNER_OFFSETS`]; a unit test asserts it does.
pub fn kernel_source<F: WgslField>(field: &F) -> String {
    let offsets = CORNER_OFFSETS
        .iter()
        .map(|[x, y, z]| format!("        vec3<f32>({x}.0, {y}.0, {z}.0),"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"// tetramarch grid evaluation kernel
// One invocation per (cell, tetrahedron, slot); each derives its own
// corner position and writes one sign and one world position.

struct GridUniforms {{
    origin: vec4<f32>,
    rotation: vec4<f32>,
    grid_size: u32,
    cell_size: f32,
    _pad0: u32,
    _pad1: u32,
}}

@group(0) @binding(0) var<uniform> grid: GridUniforms;
@group(0) @binding(1) var<storage, read> tetra_to_corner: array<u32>;
@group(0) @binding(2) var<storage, read_write> out_signs: array<u32>;
@group(0) @binding(3) var<storage, read_write> out_positions: array<vec4<f32>>;

{field_fn}

fn quat_rotate(q: vec4<f32>, v: vec3<f32>) -> vec3<f32> {{
    return v + 2.0 * cross(q.xyz, cross(q.xyz, v) + q.w * v);
}}

@compute @workgroup_size(24)
fn main(
    @builtin(workgroup_id) cell: vec3<u32>,
    @builtin(local_invocation_index) slot: u32,
) {{
    var corner_offsets = array<vec3<f32>, 8>(
{offsets}
    );

    let g = grid.grid_size;
    let half_grid = i32(g / 2u);
    let local = vec3<f32>(
        f32(i32(cell.x) - half_grid),
        f32(i32(cell.y) - half_grid),
        f32(i32(cell.z) - half_grid),
    );
    let center = grid.origin.xyz + quat_rotate(grid.rotation, grid.cell_size * local);

    let corner = tetra_to_corner[slot];
    let offset = corner_offsets[corner] * (grid.cell_size * 0.5);
    let world = center + quat_rotate(grid.rotation, offset);

    let index = ((cell.x * g + cell.y) * g + cell.z) * 24u + slot;
    out_positions[index] = vec4<f32>(world, 0.0);
    out_signs[index] = select(0u, 1u, field_contains(world));
}}
"#,
        field_fn = field.wgsl_contains(),
        offsets = offsets,
    )
}

/// True when a wgpu adapter can be acquired on this machine.
///
/// Tests and benches use this to skip the GPU path gracefully instead
/// of failing on hardware without one.
pub fn gpu_available() -> bool {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default())).is_some()
}

fn bgl_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Block until a staging buffer maps, then copy out `count` elements.
fn read_back<T: bytemuck::Pod>(
    device: &wgpu::Device,
    staging: &wgpu::Buffer,
    count: usize,
) -> Result<Vec<T>, GpuError> {
    let slice = staging.slice(..);
    let (sender, receiver) = futures_channel::oneshot::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    pollster::block_on(receiver)
        .map_err(|e| GpuError::BufferMapping(format!("channel error: {e}")))?
        .map_err(|e| GpuError::BufferMapping(format!("map error: {e:?}")))?;

    let mapped = slice.get_mapped_range();
    let data: &[T] = bytemuck::cast_slice(&mapped);
    let out = data[..count].to_vec();
    drop(mapped);
    staging.unmap();

    Ok(out)
}
