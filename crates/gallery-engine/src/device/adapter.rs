use crate::error::GalleryError;

use super::GpuInit;

/// Adapter plus the logical device and queue created on it.
pub(crate) struct DeviceBundle {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

pub(crate) fn create_instance(init: &GpuInit) -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: init.backends,
        ..Default::default()
    })
}

/// Requests an adapter (optionally compatible with `surface`) and a device on it.
///
/// There is no retry: GPU availability does not change within a session.
pub(crate) async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
    init: &GpuInit,
) -> Result<DeviceBundle, GalleryError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| GalleryError::Unsupported(e.to_string()))?;

    let info = adapter.get_info();
    log::info!(
        "using adapter \"{}\" ({:?}, {:?})",
        info.name,
        info.backend,
        info.device_type
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("gallery device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await?;

    Ok(DeviceBundle {
        adapter,
        device,
        queue,
    })
}
