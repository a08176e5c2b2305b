use gallery_engine::core::{App, AppControl, FrameCtx, InitCtx};
use gallery_engine::paint::Color;
use gallery_engine::render::shapes::{ColorSource, ShapeBatch, ShapeKind, ShapeRenderer};
use gallery_engine::sim::{GpuParticles, ParticleSystem};
use gallery_engine::GalleryError;

use super::CIRCLE_RADIUS;

/// Bouncing circles stepped by a compute kernel; the renderer reads the
/// particle buffer directly.
pub struct ComputeCirclesDemo {
    count: u32,
    gpu: Option<ComputeCirclesGpu>,
}

struct ComputeCirclesGpu {
    particles: GpuParticles,
    renderer: ShapeRenderer,
}

impl ComputeCirclesDemo {
    pub fn new(count: u32) -> Self {
        Self { count, gpu: None }
    }
}

impl App for ComputeCirclesDemo {
    fn on_init(&mut self, ctx: &InitCtx<'_>) -> Result<(), GalleryError> {
        let initial = ParticleSystem::random(self.count as usize, &mut rand::thread_rng());
        let particles = GpuParticles::new(ctx.device, &initial);

        log::info!("compute-circles: {} particles on the GPU", particles.count());
        self.gpu = Some(ComputeCirclesGpu {
            particles,
            renderer: ShapeRenderer::new(),
        });
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(gpu) = self.gpu.as_mut() else {
            return AppControl::Exit;
        };

        let dt = ctx.time.dt;
        let mut result = Ok(());
        let control = ctx.render(|rctx, target| {
            // Same encoder: the compute pass is ordered before the draw.
            gpu.particles.dispatch(target.encoder, rctx.queue, dt);
            result = gpu.renderer.draw(
                rctx,
                target,
                ShapeBatch {
                    kind: ShapeKind::Circle,
                    centers: gpu.particles.positions(),
                    radius: CIRCLE_RADIUS,
                    color: ColorSource::PerInstance(gpu.particles.colors()),
                    instance_count: gpu.particles.count(),
                },
                Some(Color::BACKGROUND),
            );
        });

        match result {
            Ok(()) => control,
            Err(err) => {
                log::error!("compute-circles draw failed: {err}");
                AppControl::Exit
            }
        }
    }
}
