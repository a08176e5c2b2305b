//! Gallery engine crate.
//!
//! GPU device setup, resource builders, the shape and texture renderers, the
//! particle simulation and the window runtime the demos run on.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod error;
pub mod logging;
pub mod paint;
pub mod render;
pub mod sim;

pub use error::{FailureNotice, GalleryError};
