use gallery_engine::core::{App, AppControl, FrameCtx, InitCtx};
use gallery_engine::paint::Color;
use gallery_engine::render::resources::create_buffer_from_data;
use gallery_engine::render::shapes::{ColorSource, ShapeBatch, ShapeKind, ShapeRenderer};
use gallery_engine::render::RenderCtx;
use gallery_engine::sim::ParticleSystem;
use gallery_engine::GalleryError;

use super::CIRCLE_RADIUS;

/// Bouncing circles integrated on the CPU and re-uploaded every frame.
pub struct CirclesDemo {
    sim: ParticleSystem,
    gpu: Option<CirclesGpu>,
}

struct CirclesGpu {
    centers: wgpu::Buffer,
    colors: wgpu::Buffer,
    renderer: ShapeRenderer,
}

impl CirclesDemo {
    pub fn new(count: u32) -> Self {
        Self {
            sim: ParticleSystem::random(count as usize, &mut rand::thread_rng()),
            gpu: None,
        }
    }
}

impl App for CirclesDemo {
    fn on_init(&mut self, ctx: &InitCtx<'_>) -> Result<(), GalleryError> {
        let centers = create_buffer_from_data(
            ctx.device,
            "circle centers",
            self.sim.positions(),
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        let colors = create_buffer_from_data(
            ctx.device,
            "circle colors",
            self.sim.colors(),
            wgpu::BufferUsages::STORAGE,
        );

        let mut renderer = ShapeRenderer::new();
        renderer.prepare(&RenderCtx::new(ctx.device, ctx.queue, ctx.surface_format, ctx.size));

        log::info!("circles: {} particles on the CPU", self.sim.len());
        self.gpu = Some(CirclesGpu {
            centers,
            colors,
            renderer,
        });
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(gpu) = self.gpu.as_mut() else {
            return AppControl::Exit;
        };

        self.sim.step(ctx.time.dt);
        let sim = &self.sim;

        let mut result = Ok(());
        let control = ctx.render(|rctx, target| {
            rctx.queue
                .write_buffer(&gpu.centers, 0, bytemuck::cast_slice(sim.positions()));
            result = gpu.renderer.draw(
                rctx,
                target,
                ShapeBatch {
                    kind: ShapeKind::Circle,
                    centers: &gpu.centers,
                    radius: CIRCLE_RADIUS,
                    color: ColorSource::PerInstance(&gpu.colors),
                    instance_count: sim.len() as u32,
                },
                Some(Color::BACKGROUND),
            );
        });

        match result {
            Ok(()) => control,
            Err(err) => {
                log::error!("circle draw failed: {err}");
                AppControl::Exit
            }
        }
    }
}
