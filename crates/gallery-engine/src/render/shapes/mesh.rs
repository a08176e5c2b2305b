use bytemuck::{Pod, Zeroable};

/// Wedges used to approximate a circle unless configured otherwise.
pub const DEFAULT_CIRCLE_SEGMENTS: u32 = 32;

/// Shape drawn by one batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Circle,
    Rectangle,
    Line,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub pos: [f32; 2],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const fn v(x: f32, y: f32) -> MeshVertex {
    MeshVertex { pos: [x, y] }
}

/// Static unit mesh shared by every instance of one shape kind.
///
/// Vertices are in instance-local units: the shader scales them by the batch
/// radius and offsets them by the instance center.
#[derive(Debug, Clone)]
pub struct ShapeMesh {
    kind: ShapeKind,
    vertices: Vec<MeshVertex>,
}

impl ShapeMesh {
    /// Unit circle as `segments` triangle wedges around the origin.
    pub fn circle(segments: u32) -> Self {
        let segments = segments.max(3);
        let step = std::f32::consts::TAU / segments as f32;

        let vertices = (0..segments)
            .flat_map(|i| {
                let a1 = i as f32 * step;
                let a2 = (i + 1) as f32 * step;
                [v(0.0, 0.0), v(a2.cos(), a2.sin()), v(a1.cos(), a1.sin())]
            })
            .collect();

        Self {
            kind: ShapeKind::Circle,
            vertices,
        }
    }

    /// Unit square centered on the origin, as two triangles.
    pub fn rectangle() -> Self {
        Self {
            kind: ShapeKind::Rectangle,
            vertices: vec![
                v(-0.5, -0.5),
                v(0.5, -0.5),
                v(0.5, 0.5),
                v(-0.5, 0.5),
                v(-0.5, -0.5),
                v(0.5, 0.5),
            ],
        }
    }

    /// Segment from the instance center along +X.
    pub fn line() -> Self {
        Self {
            kind: ShapeKind::Line,
            vertices: vec![v(0.0, 0.0), v(1.0, 0.0)],
        }
    }

    /// Unit mesh for `kind`; `circle_segments` only applies to circles.
    pub fn for_kind(kind: ShapeKind, circle_segments: u32) -> Self {
        match kind {
            ShapeKind::Circle => Self::circle(circle_segments),
            ShapeKind::Rectangle => Self::rectangle(),
            ShapeKind::Line => Self::line(),
        }
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn topology(&self) -> wgpu::PrimitiveTopology {
        match self.kind {
            ShapeKind::Line => wgpu::PrimitiveTopology::LineList,
            ShapeKind::Circle | ShapeKind::Rectangle => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_has_three_vertices_per_segment() {
        let mesh = ShapeMesh::circle(DEFAULT_CIRCLE_SEGMENTS);
        assert_eq!(mesh.vertex_count(), 96);
        assert_eq!(ShapeMesh::circle(5).vertex_count(), 15);
    }

    #[test]
    fn circle_wedges_fan_from_center_onto_unit_circle() {
        let mesh = ShapeMesh::circle(8);
        for wedge in mesh.vertices().chunks(3) {
            assert_eq!(wedge[0].pos, [0.0, 0.0]);
            for rim in &wedge[1..] {
                let r = (rim.pos[0] * rim.pos[0] + rim.pos[1] * rim.pos[1]).sqrt();
                assert!((r - 1.0).abs() < 1e-5);
            }
        }
        // First wedge spans angle 0 to 2π/8, listed (center, a2, a1).
        let first = &mesh.vertices()[..3];
        assert!((first[2].pos[0] - 1.0).abs() < 1e-6);
        assert!(first[1].pos[1] > 0.0);
    }

    #[test]
    fn rectangle_is_two_triangles_in_unit_square() {
        let mesh = ShapeMesh::rectangle();
        assert_eq!(mesh.vertex_count(), 6);
        assert!(mesh
            .vertices()
            .iter()
            .all(|v| v.pos.iter().all(|c| c.abs() == 0.5)));
        assert_eq!(mesh.topology(), wgpu::PrimitiveTopology::TriangleList);
    }

    #[test]
    fn line_is_one_segment() {
        let mesh = ShapeMesh::line();
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.topology(), wgpu::PrimitiveTopology::LineList);
    }

    #[test]
    fn meshes_by_kind_carry_their_topology() {
        let circle = ShapeMesh::for_kind(ShapeKind::Circle, 12);
        assert_eq!(circle.vertex_count(), 36);
        assert_eq!(circle.topology(), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(ShapeMesh::for_kind(ShapeKind::Rectangle, 12).vertex_count(), 6);
        assert_eq!(
            ShapeMesh::for_kind(ShapeKind::Line, 12).topology(),
            wgpu::PrimitiveTopology::LineList
        );
    }

    #[test]
    fn degenerate_segment_counts_are_raised() {
        assert_eq!(ShapeMesh::circle(0).vertex_count(), 9);
    }
}
