use bytemuck::{Pod, Zeroable};

use crate::render::resources::{create_buffer_from_data, workgroup_count};

use super::ParticleSystem;

/// Threads per workgroup in `particles.wgsl`.
pub const PARTICLE_WORKGROUP_SIZE: u32 = 64;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ParticleParams {
    dt: f32,
    count: u32,
    _pad: [u32; 2],
}

/// Particle pool stepped by a compute kernel.
///
/// Positions live in a storage buffer that the shape renderer can read
/// directly as its centers buffer, so nothing round-trips through the CPU.
pub struct GpuParticles {
    count: u32,
    positions: wgpu::Buffer,
    velocities: wgpu::Buffer,
    colors: wgpu::Buffer,
    params: wgpu::Buffer,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
}

impl GpuParticles {
    /// Uploads `initial` and builds the step pipeline.
    pub fn new(device: &wgpu::Device, initial: &ParticleSystem) -> Self {
        let count = initial.len() as u32;
        let usage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC;

        // Storage bindings may not be zero-sized; an empty pool still gets one slot.
        let positions = create_buffer_from_data(
            device,
            "gallery particle positions",
            &non_empty(initial.positions(), [0.0; 2])[..],
            usage,
        );
        let velocities = create_buffer_from_data(
            device,
            "gallery particle velocities",
            &non_empty(initial.velocities(), [0.0; 2])[..],
            usage,
        );
        let colors = create_buffer_from_data(
            device,
            "gallery particle colors",
            &non_empty(initial.colors(), [0.0; 4])[..],
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        let params = create_buffer_from_data(
            device,
            "gallery particle params",
            &[ParticleParams {
                dt: 0.0,
                count,
                _pad: [0; 2],
            }],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gallery particle kernel"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particles.wgsl").into()),
        });

        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gallery particle bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gallery particle pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("gallery particle pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gallery particle bind group"),
            layout: &bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: velocities.as_entire_binding(),
                },
            ],
        });

        log::debug!("gpu particle pool ready: {count} particles");

        Self {
            count,
            positions,
            velocities,
            colors,
            params,
            pipeline,
            bind_group,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// `vec2<f32>` per particle; usable as the shape renderer's centers buffer.
    pub fn positions(&self) -> &wgpu::Buffer {
        &self.positions
    }

    /// `vec4<f32>` per particle; usable as a per-instance color buffer.
    pub fn colors(&self) -> &wgpu::Buffer {
        &self.colors
    }

    /// Records one simulation step of `dt` seconds into `encoder`.
    pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, queue: &wgpu::Queue, dt: f32) {
        if self.count == 0 {
            return;
        }

        queue.write_buffer(
            &self.params,
            0,
            bytemuck::bytes_of(&ParticleParams {
                dt,
                count: self.count,
                _pad: [0; 2],
            }),
        );

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("gallery particle step"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.dispatch_workgroups(workgroup_count(self.count, PARTICLE_WORKGROUP_SIZE), 1, 1);
    }
}

fn non_empty<T: Copy>(data: &[T], filler: T) -> std::borrow::Cow<'_, [T]> {
    if data.is_empty() {
        std::borrow::Cow::Owned(vec![filler])
    } else {
        std::borrow::Cow::Borrowed(data)
    }
}
