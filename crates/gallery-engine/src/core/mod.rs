//! Contract between the window runtime and the demos.
//!
//! Demos build their GPU resources in `on_init` and record one frame per
//! `on_frame`. Resources stay owned by the demo value.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, InitCtx, WindowCtx};
