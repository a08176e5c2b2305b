//! Error taxonomy shared by the engine and the demos.

use std::path::PathBuf;

/// Errors raised while bringing a demo up or issuing a draw.
///
/// GPU validation errors (bad pipeline or buffer descriptions) are not part of
/// this type: wgpu reports them through its own error handler.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// No GPU adapter is exposed on this platform (or for the requested backends).
    #[error("no compatible GPU adapter found: {0}")]
    Unsupported(String),

    #[error("failed to create window")]
    CreateWindow(#[from] winit::error::OsError),

    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported pixel formats")]
    NoSurfaceFormat,

    #[error("drawable surface has zero size")]
    ZeroSize,

    /// A shader source file could not be read.
    #[error("failed to load shader {}", path.display())]
    ShaderNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mapping a buffer for read-back failed.
    #[error("buffer read-back failed: {0}")]
    Readback(String),

    /// Particle attributes of different lengths.
    #[error("particle attributes disagree: {positions} positions, {velocities} velocities, {colors} colors")]
    ParticleLayout {
        positions: usize,
        velocities: usize,
        colors: usize,
    },

    /// A draw asked for more instances than the bound buffer holds.
    #[error("{buffer} buffer holds {capacity} instances, draw requested {requested}")]
    CapacityExceeded {
        buffer: &'static str,
        requested: u32,
        capacity: u64,
    },
}

/// User-facing outcome of a failed demo start.
///
/// The runtime creates the window hidden and only shows it once the GPU and the
/// demo are ready, so a failure always leaves the surface hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    message: String,
    surface_visible: bool,
}

impl FailureNotice {
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = format!("Error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        Self {
            message,
            surface_visible: false,
        }
    }

    /// Message shown to the user in place of the demo.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn surface_visible(&self) -> bool {
        self.surface_visible
    }
}
