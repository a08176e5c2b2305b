//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers) and record into a
//! caller-provided encoder; submission happens once per frame.
//!
//! Convention:
//! - positions are normalized device coordinates in `[-1, 1]`, +Y up
//! - shape vertex shaders divide local X by the target aspect ratio so
//!   circles stay round

mod common;
mod ctx;
mod retire;
mod storage_texture;
mod texture;

pub mod resources;
pub mod shapes;

pub use ctx::{RenderCtx, RenderTarget};
pub use retire::RetireQueue;
pub use storage_texture::{StorageTexture, STORAGE_TEXTURE_FORMAT};
pub use texture::TextureRenderer;
