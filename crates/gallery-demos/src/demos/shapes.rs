use gallery_engine::core::{App, AppControl, FrameCtx, InitCtx};
use gallery_engine::paint::Color;
use gallery_engine::render::resources::create_buffer_from_data;
use gallery_engine::render::shapes::{ColorSource, ShapeBatch, ShapeKind, ShapeRenderer};
use gallery_engine::sim::ParticleSystem;
use gallery_engine::GalleryError;

use super::CIRCLE_RADIUS;

const GRID: usize = 6;
const TILE_SIZE: f32 = 0.18;
const TILE_COLOR: Color = Color::new(0.22, 0.24, 0.32, 1.0);
const MARK_LENGTH: f32 = 0.06;
const MARK_COLOR: Color = Color::new(0.9, 0.75, 0.3, 1.0);

/// Static rectangle grid with tick lines, and CPU circles bouncing over it.
///
/// All three layers go through one `draw_batches` call, so they share a
/// single cleared pass.
pub struct ShapesDemo {
    sim: ParticleSystem,
    gpu: Option<ShapesGpu>,
}

struct ShapesGpu {
    grid: wgpu::Buffer,
    grid_len: u32,
    centers: wgpu::Buffer,
    colors: wgpu::Buffer,
    renderer: ShapeRenderer,
}

impl ShapesDemo {
    pub fn new(count: u32) -> Self {
        Self {
            sim: ParticleSystem::random(count as usize, &mut rand::thread_rng()),
            gpu: None,
        }
    }
}

/// Tile centers of a `n` x `n` grid spread over `[-1, 1]²`.
fn grid_centers(n: usize) -> Vec<[f32; 2]> {
    let step = 2.0 / n as f32;
    (0..n * n)
        .map(|i| {
            let (col, row) = (i % n, i / n);
            [
                -1.0 + step * (col as f32 + 0.5),
                -1.0 + step * (row as f32 + 0.5),
            ]
        })
        .collect()
}

impl App for ShapesDemo {
    fn on_init(&mut self, ctx: &InitCtx<'_>) -> Result<(), GalleryError> {
        let grid_points = grid_centers(GRID);
        let grid = create_buffer_from_data(
            ctx.device,
            "shapes grid",
            &grid_points,
            wgpu::BufferUsages::STORAGE,
        );
        let centers = create_buffer_from_data(
            ctx.device,
            "shapes circle centers",
            self.sim.positions(),
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        );
        let colors = create_buffer_from_data(
            ctx.device,
            "shapes circle colors",
            self.sim.colors(),
            wgpu::BufferUsages::STORAGE,
        );

        self.gpu = Some(ShapesGpu {
            grid,
            grid_len: grid_points.len() as u32,
            centers,
            colors,
            renderer: ShapeRenderer::new(),
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

            let batches = [
                ShapeBatch {
                    kind: ShapeKind::Rectangle,
                    centers: &gpu.grid,
                    radius: TILE_SIZE,
                    color: ColorSource::Flat(TILE_COLOR),
                    instance_count: gpu.grid_len,
                },
                ShapeBatch {
                    kind: ShapeKind::Line,
                    centers: &gpu.grid,
                    radius: MARK_LENGTH,
                    color: ColorSource::Flat(MARK_COLOR),
                    instance_count: gpu.grid_len,
                },
                ShapeBatch {
                    kind: ShapeKind::Circle,
                    centers: &gpu.centers,
                    radius: CIRCLE_RADIUS,
                    color: ColorSource::PerInstance(&gpu.colors),
                    instance_count: sim.len() as u32,
                },
            ];
            result = gpu
                .renderer
                .draw_batches(rctx, target, &batches, Some(Color::BACKGROUND));
        });

        match result {
            Ok(()) => control,
            Err(err) => {
                log::error!("shapes draw failed: {err}");
                AppControl::Exit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_tiles_are_centered_in_their_cells() {
        let points = grid_centers(2);
        assert_eq!(points, vec![[-0.5, -0.5], [0.5, -0.5], [-0.5, 0.5], [0.5, 0.5]]);
    }

    #[test]
    fn grid_stays_inside_clip_space() {
        let points = grid_centers(GRID);
        assert_eq!(points.len(), GRID * GRID);
        assert!(points.iter().flatten().all(|c| c.abs() < 1.0));
    }
}
