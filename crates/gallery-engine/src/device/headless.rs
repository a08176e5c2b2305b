use crate::error::GalleryError;

use super::adapter;
use super::GpuInit;

/// Device and queue without a presentation surface.
///
/// Used for adapter probing and for rendering into offscreen textures.
pub struct HeadlessGpu {
    _instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new(init: GpuInit) -> Result<Self, GalleryError> {
        let instance = adapter::create_instance(&init);
        let adapter::DeviceBundle {
            adapter,
            device,
            queue,
        } = adapter::request_device(&instance, None, &init).await?;

        Ok(Self {
            _instance: instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
