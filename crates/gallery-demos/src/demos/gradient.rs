use std::path::PathBuf;

use gallery_engine::core::{App, AppControl, FrameCtx, InitCtx};
use gallery_engine::render::resources::{create_shader_module, load_shader_source, workgroup_count};
use gallery_engine::render::{StorageTexture, TextureRenderer, STORAGE_TEXTURE_FORMAT};
use gallery_engine::GalleryError;

const WORKGROUP_SIZE: u32 = 8;

/// Animated gradient written by a compute kernel, then drawn full screen.
pub struct GradientDemo {
    shader_path: PathBuf,
    gpu: Option<GradientGpu>,
}

struct GradientGpu {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    time_ubo: wgpu::Buffer,
    output: StorageTexture,
    bind_group: wgpu::BindGroup,
    presenter: TextureRenderer,
}

impl GradientDemo {
    pub fn new(shader_path: PathBuf) -> Self {
        Self {
            shader_path,
            gpu: None,
        }
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    output: &StorageTexture,
    time_ubo: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("gradient bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(output.view()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: time_ubo.as_entire_binding(),
            },
        ],
    })
}

impl App for GradientDemo {
    fn on_init(&mut self, ctx: &InitCtx<'_>) -> Result<(), GalleryError> {
        let source = load_shader_source(&self.shader_path)?;
        let shader = create_shader_module(ctx.device, "gradient kernel", &source);

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("gradient bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::StorageTexture {
                            access: wgpu::StorageTextureAccess::WriteOnly,
                            format: STORAGE_TEXTURE_FORMAT,
                            view_dimension: wgpu::TextureViewDimension::D2,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gradient pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("gradient pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        // f32 time, padded to 16 bytes.
        let time_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gradient time ubo"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let output = StorageTexture::new(
            ctx.device,
            ctx.size.width,
            ctx.size.height,
            ctx.frames_in_flight,
        );
        let bind_group = create_bind_group(ctx.device, &bind_group_layout, &output, &time_ubo);

        self.gpu = Some(GradientGpu {
            pipeline,
            bind_group_layout,
            time_ubo,
            output,
            bind_group,
            presenter: TextureRenderer::new(),
        });
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(gpu) = self.gpu.as_mut() else {
            return AppControl::Exit;
        };

        let frame = ctx.frame_index();
        let elapsed = ctx.time.elapsed;

        ctx.render(|rctx, target| {
            let (width, height) = (rctx.size.width, rctx.size.height);
            if gpu.output.ensure_size(rctx.device, width, height, frame) {
                gpu.bind_group =
                    create_bind_group(rctx.device, &gpu.bind_group_layout, &gpu.output, &gpu.time_ubo);
            }

            rctx.queue
                .write_buffer(&gpu.time_ubo, 0, bytemuck::bytes_of(&[elapsed, 0.0, 0.0, 0.0]));

            {
                let mut pass = target.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("gradient compute"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&gpu.pipeline);
                pass.set_bind_group(0, &gpu.bind_group, &[]);
                pass.dispatch_workgroups(
                    workgroup_count(gpu.output.width(), WORKGROUP_SIZE),
                    workgroup_count(gpu.output.height(), WORKGROUP_SIZE),
                    1,
                );
            }

            gpu.presenter.draw(rctx, target, gpu.output.view(), None);
        })
    }
}
