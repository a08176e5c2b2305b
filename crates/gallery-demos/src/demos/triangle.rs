use std::path::PathBuf;

use gallery_engine::core::{App, AppControl, FrameCtx, InitCtx};
use gallery_engine::paint::Color;
use gallery_engine::render::resources::{create_shader_module, load_shader_source};
use gallery_engine::GalleryError;

/// One colored triangle on the background color.
pub struct TriangleDemo {
    shader_path: PathBuf,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl TriangleDemo {
    pub fn new(shader_path: PathBuf) -> Self {
        Self {
            shader_path,
            pipeline: None,
        }
    }
}

impl App for TriangleDemo {
    fn on_init(&mut self, ctx: &InitCtx<'_>) -> Result<(), GalleryError> {
        let source = load_shader_source(&self.shader_path)?;
        let shader = create_shader_module(ctx.device, "triangle shader", &source);

        self.pipeline = Some(ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("triangle pipeline"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(ctx.surface_format.into())],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        }));
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return AppControl::Exit;
        };

        ctx.render(|_, target| {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("triangle pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(Color::BACKGROUND.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_pipeline(pipeline);
            rpass.draw(0..3, 0..1);
        })
    }
}
