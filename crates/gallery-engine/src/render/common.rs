//! Small helpers shared by the renderers.

use crate::paint::Color;

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// `Some(color)` clears the attachment on load, `None` keeps its contents.
pub(super) fn load_op(clear: Option<Color>) -> wgpu::LoadOp<wgpu::Color> {
    match clear {
        Some(c) => wgpu::LoadOp::Clear(c.to_wgpu()),
        None => wgpu::LoadOp::Load,
    }
}

/// Returns the minimum binding size for a uniform/storage struct of type `T`.
pub(super) fn min_binding_size<T>() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64)
}
