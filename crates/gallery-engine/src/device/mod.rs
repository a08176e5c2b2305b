//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//!
//! `HeadlessGpu` shares the adapter/device path without a surface; it backs
//! adapter probing and the GPU tests.

mod adapter;
mod context;
mod error;
mod frame;
mod headless;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use headless::HeadlessGpu;
pub use init::GpuInit;
pub use surface::clamp_surface_extent;
