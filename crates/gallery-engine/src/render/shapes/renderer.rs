use bytemuck::{Pod, Zeroable};

use crate::error::GalleryError;
use crate::paint::Color;
use crate::render::resources::create_buffer_from_data;
use crate::render::{RenderCtx, RenderTarget};

use crate::render::common::{load_op, min_binding_size, premul_alpha_blend};
use super::mesh::{MeshVertex, ShapeKind, ShapeMesh, DEFAULT_CIRCLE_SEGMENTS};

const CENTER_STRIDE: u64 = std::mem::size_of::<[f32; 2]>() as u64;
const COLOR_STRIDE: u64 = std::mem::size_of::<[f32; 4]>() as u64;

/// Where a batch takes its fill color from.
#[derive(Debug, Copy, Clone)]
pub enum ColorSource<'a> {
    /// One color for every instance.
    Flat(Color),
    /// Storage buffer holding one `[f32; 4]` per instance.
    PerInstance(&'a wgpu::Buffer),
}

/// One instanced draw: `instance_count` copies of a shape.
///
/// `centers` holds one `[f32; 2]` per instance in normalized device coordinates.
/// Both storage buffers need `BufferUsages::STORAGE`.
#[derive(Debug, Copy, Clone)]
pub struct ShapeBatch<'a> {
    pub kind: ShapeKind,
    pub centers: &'a wgpu::Buffer,
    /// Radius for circles, edge length for rectangles, length for lines.
    pub radius: f32,
    pub color: ColorSource<'a>,
    pub instance_count: u32,
}

impl ShapeBatch<'_> {
    /// Rejects batches whose instance count overruns a bound buffer.
    pub fn validate(&self) -> Result<(), GalleryError> {
        check_capacity("centers", self.centers.size(), CENTER_STRIDE, self.instance_count)?;
        if let ColorSource::PerInstance(colors) = self.color {
            check_capacity("colors", colors.size(), COLOR_STRIDE, self.instance_count)?;
        }
        Ok(())
    }
}

fn check_capacity(
    buffer: &'static str,
    size: u64,
    stride: u64,
    requested: u32,
) -> Result<(), GalleryError> {
    let capacity = size / stride;
    if u64::from(requested) > capacity {
        return Err(GalleryError::CapacityExceeded {
            buffer,
            requested,
            capacity,
        });
    }
    Ok(())
}

/// Per-batch uniform block (48 bytes, 12 floats):
///
///  offset  0  radius            f32
///  offset 16  color             [f32; 4]
///  offset 32  use_color_buffer  f32 (0 or 1)
///  offset 36  aspect_ratio      f32
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShapeUniform {
    pub radius: f32,
    pub _pad0: [f32; 3],
    pub color: [f32; 4],
    pub use_color_buffer: f32,
    pub aspect_ratio: f32,
    pub _pad1: [f32; 2],
}

impl ShapeUniform {
    pub fn new(radius: f32, color: &ColorSource<'_>, aspect_ratio: f32) -> Self {
        let (color, use_color_buffer) = match color {
            ColorSource::Flat(c) => (c.to_array(), 0.0),
            ColorSource::PerInstance(_) => ([1.0; 4], 1.0),
        };
        Self {
            radius,
            _pad0: [0.0; 3],
            color,
            use_color_buffer,
            aspect_ratio,
            _pad1: [0.0; 2],
        }
    }
}

struct MeshBuffer {
    vbo: wgpu::Buffer,
    vertex_count: u32,
    topology: wgpu::PrimitiveTopology,
}

/// Renderer drawing instanced circles, rectangles and lines.
///
/// GPU objects are built on first use (or by `prepare`) and rebuilt when the
/// target format changes. Every batch of one call is recorded into a single
/// render pass; `clear` decides whether that pass starts from a cleared target.
pub struct ShapeRenderer {
    circle_segments: u32,

    pipeline_format: Option<wgpu::TextureFormat>,
    triangle_pipeline: Option<wgpu::RenderPipeline>,
    line_pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,

    circle_mesh: Option<MeshBuffer>,
    rectangle_mesh: Option<MeshBuffer>,
    line_mesh: Option<MeshBuffer>,

    uniform_ubo: Option<wgpu::Buffer>,
    uniform_stride: u64,
    uniform_capacity: usize,

    // Bound to the colors slot when a batch uses a flat color.
    dummy_colors: Option<wgpu::Buffer>,
}

impl Default for ShapeRenderer {
    fn default() -> Self {
        Self::with_circle_segments(DEFAULT_CIRCLE_SEGMENTS)
    }
}

impl ShapeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_circle_segments(circle_segments: u32) -> Self {
        Self {
            circle_segments,
            pipeline_format: None,
            triangle_pipeline: None,
            line_pipeline: None,
            bind_group_layout: None,
            circle_mesh: None,
            rectangle_mesh: None,
            line_mesh: None,
            uniform_ubo: None,
            uniform_stride: 0,
            uniform_capacity: 0,
            dummy_colors: None,
        }
    }

    /// True once pipelines and static buffers exist for some target format.
    pub fn is_ready(&self) -> bool {
        self.triangle_pipeline.is_some()
            && self.line_pipeline.is_some()
            && self.circle_mesh.is_some()
            && self.uniform_ubo.is_some()
            && self.dummy_colors.is_some()
    }

    /// Builds pipelines, meshes and the uniform buffer ahead of the first draw.
    pub fn prepare(&mut self, ctx: &RenderCtx<'_>) {
        self.ensure_pipelines(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_uniform_capacity(ctx, 1);
    }

    /// Draws a single batch in its own pass.
    pub fn draw(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        batch: ShapeBatch<'_>,
        clear: Option<Color>,
    ) -> Result<(), GalleryError> {
        self.draw_batches(ctx, target, &[batch], clear)
    }

    /// Draws all `batches`, in order, inside one render pass.
    ///
    /// Every batch is validated before anything is recorded, so a capacity error
    /// leaves the target untouched.
    ///
    /// Uniforms are staged through `Queue::write_buffer` and land at the next
    /// submit, so one renderer records one call per submitted encoder. Layer
    /// shapes by passing several batches.
    pub fn draw_batches(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        batches: &[ShapeBatch<'_>],
        clear: Option<Color>,
    ) -> Result<(), GalleryError> {
        for batch in batches {
            batch.validate()?;
        }

        self.prepare(ctx);
        self.ensure_uniform_capacity(ctx, batches.len());
        self.write_uniforms(ctx, batches);

        let bind_groups: Vec<Option<wgpu::BindGroup>> = batches
            .iter()
            .map(|b| (b.instance_count > 0).then(|| self.create_bind_group(ctx, b)).flatten())
            .collect();

        let (
            Some(triangle_pipeline),
            Some(line_pipeline),
            Some(circle),
            Some(rectangle),
            Some(line),
        ) = (
            self.triangle_pipeline.as_ref(),
            self.line_pipeline.as_ref(),
            self.circle_mesh.as_ref(),
            self.rectangle_mesh.as_ref(),
            self.line_mesh.as_ref(),
        )
        else {
            return Ok(());
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("gallery shape pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_op(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for (i, (batch, bind_group)) in batches.iter().zip(&bind_groups).enumerate() {
            let Some(bind_group) = bind_group else { continue };

            let mesh = match batch.kind {
                ShapeKind::Circle => circle,
                ShapeKind::Rectangle => rectangle,
                ShapeKind::Line => line,
            };
            let pipeline = pipeline_for(mesh.topology, triangle_pipeline, line_pipeline);

            let offset = (i as u64 * self.uniform_stride) as u32;
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, bind_group, &[offset]);
            rpass.set_vertex_buffer(0, mesh.vbo.slice(..));
            rpass.draw(0..mesh.vertex_count, 0..batch.instance_count);
        }

        Ok(())
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.triangle_pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gallery shape shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shapes.wgsl").into()),
        });

        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("gallery shape bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: min_binding_size::<ShapeUniform>(),
                        },
                        count: None,
                    },
                    storage_entry(1),
                    storage_entry(2),
                ],
            });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gallery shape pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let make_pipeline = |label, topology| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[MeshVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(premul_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        self.triangle_pipeline = Some(make_pipeline(
            "gallery shape triangle pipeline",
            wgpu::PrimitiveTopology::TriangleList,
        ));
        self.line_pipeline = Some(make_pipeline(
            "gallery shape line pipeline",
            wgpu::PrimitiveTopology::LineList,
        ));
        self.bind_group_layout = Some(bind_group_layout);
        self.pipeline_format = Some(ctx.surface_format);

        log::debug!("shape pipelines built for {:?}", ctx.surface_format);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        let segments = self.circle_segments;
        for (kind, slot) in [
            (ShapeKind::Circle, &mut self.circle_mesh),
            (ShapeKind::Rectangle, &mut self.rectangle_mesh),
            (ShapeKind::Line, &mut self.line_mesh),
        ] {
            if slot.is_none() {
                *slot = Some(upload_mesh(ctx, &ShapeMesh::for_kind(kind, segments)));
            }
        }
        if self.dummy_colors.is_none() {
            self.dummy_colors = Some(create_buffer_from_data(
                ctx.device,
                "gallery shape dummy colors",
                &[[1.0f32; 4]],
                wgpu::BufferUsages::STORAGE,
            ));
        }
    }

    fn ensure_uniform_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.uniform_capacity && self.uniform_ubo.is_some() {
            return;
        }

        let alignment = u64::from(ctx.device.limits().min_uniform_buffer_offset_alignment);
        let size = std::mem::size_of::<ShapeUniform>() as u64;
        self.uniform_stride = size.div_ceil(alignment) * alignment;

        let new_cap = required.next_power_of_two().max(4);
        self.uniform_ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gallery shape uniforms"),
            size: new_cap as u64 * self.uniform_stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.uniform_capacity = new_cap;
    }

    fn write_uniforms(&self, ctx: &RenderCtx<'_>, batches: &[ShapeBatch<'_>]) {
        let Some(ubo) = self.uniform_ubo.as_ref() else { return };
        if batches.is_empty() {
            return;
        }

        let stride = self.uniform_stride as usize;
        let aspect = ctx.aspect_ratio();
        let mut bytes = vec![0u8; stride * batches.len()];
        for (slot, batch) in bytes.chunks_exact_mut(stride).zip(batches) {
            let uniform = ShapeUniform::new(batch.radius, &batch.color, aspect);
            slot[..std::mem::size_of::<ShapeUniform>()].copy_from_slice(bytemuck::bytes_of(&uniform));
        }
        ctx.queue.write_buffer(ubo, 0, &bytes);
    }

    fn create_bind_group(&self, ctx: &RenderCtx<'_>, batch: &ShapeBatch<'_>) -> Option<wgpu::BindGroup> {
        let layout = self.bind_group_layout.as_ref()?;
        let ubo = self.uniform_ubo.as_ref()?;
        let colors = match batch.color {
            ColorSource::PerInstance(buffer) => buffer,
            ColorSource::Flat(_) => self.dummy_colors.as_ref()?,
        };

        Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gallery shape bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: ubo,
                        offset: 0,
                        size: min_binding_size::<ShapeUniform>(),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: batch.centers.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: colors.as_entire_binding(),
                },
            ],
        }))
    }
}

fn upload_mesh(ctx: &RenderCtx<'_>, mesh: &ShapeMesh) -> MeshBuffer {
    MeshBuffer {
        vbo: create_buffer_from_data(
            ctx.device,
            "gallery shape mesh vbo",
            mesh.vertices(),
            wgpu::BufferUsages::VERTEX,
        ),
        vertex_count: mesh.vertex_count(),
        topology: mesh.topology(),
    }
}

/// Picks the pipeline whose primitive topology matches the mesh.
fn pipeline_for<'p, P>(topology: wgpu::PrimitiveTopology, triangles: &'p P, lines: &'p P) -> &'p P {
    match topology {
        wgpu::PrimitiveTopology::LineList | wgpu::PrimitiveTopology::LineStrip => lines,
        _ => triangles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_twelve_floats() {
        assert_eq!(std::mem::size_of::<ShapeUniform>(), 48);
    }

    #[test]
    fn flat_color_uniform_layout() {
        let u = ShapeUniform::new(0.025, &ColorSource::Flat(Color::new(0.2, 0.4, 0.6, 1.0)), 2.0);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&u));
        assert_eq!(
            floats,
            &[0.025, 0.0, 0.0, 0.0, 0.2, 0.4, 0.6, 1.0, 0.0, 2.0, 0.0, 0.0]
        );
    }

    #[test]
    fn pipeline_follows_mesh_topology() {
        for kind in [ShapeKind::Circle, ShapeKind::Rectangle, ShapeKind::Line] {
            let mesh = ShapeMesh::for_kind(kind, DEFAULT_CIRCLE_SEGMENTS);
            let chosen = *pipeline_for(mesh.topology(), &"triangles", &"lines");
            let expected = if kind == ShapeKind::Line { "lines" } else { "triangles" };
            assert_eq!(chosen, expected, "{kind:?}");
        }
    }

    #[test]
    fn capacity_check_counts_whole_instances() {
        assert!(check_capacity("centers", 256 * CENTER_STRIDE, CENTER_STRIDE, 256).is_ok());
        assert!(check_capacity("centers", 0, CENTER_STRIDE, 0).is_ok());

        let err = check_capacity("colors", 255 * COLOR_STRIDE + 8, COLOR_STRIDE, 256).unwrap_err();
        assert!(matches!(
            err,
            GalleryError::CapacityExceeded {
                buffer: "colors",
                requested: 256,
                capacity: 255
            }
        ));
    }
}
