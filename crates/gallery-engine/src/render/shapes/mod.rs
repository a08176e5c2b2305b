//! Instanced shape rendering (circles, rectangles, lines).

mod mesh;
mod renderer;

pub use mesh::{MeshVertex, ShapeKind, ShapeMesh, DEFAULT_CIRCLE_SEGMENTS};
pub use renderer::{ColorSource, ShapeBatch, ShapeRenderer, ShapeUniform};
