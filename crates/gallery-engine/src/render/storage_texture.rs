use super::retire::RetireQueue;

/// Format written by compute kernels and sampled by the texture renderer.
pub const STORAGE_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Size-dependent texture written by a compute pass and sampled afterwards.
///
/// Recreated when the drawable size changes. The replaced texture is retired
/// instead of dropped so frames still in flight keep a live resource.
pub struct StorageTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    retired: RetireQueue<wgpu::Texture>,
}

impl StorageTexture {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, frames_in_flight: u32) -> Self {
        let texture = create_texture(device, width, height);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            retired: RetireQueue::new(frames_in_flight),
        }
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Matches the texture to `width` x `height` for `frame`.
    ///
    /// Returns `true` when the texture was replaced; bind groups referencing the
    /// old view must then be rebuilt.
    pub fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32, frame: u64) -> bool {
        self.retired.collect(frame);

        let (width, height) = (width.max(1), height.max(1));
        if self.width() == width && self.height() == height {
            return false;
        }

        log::debug!(
            "storage texture resized {}x{} -> {}x{}",
            self.width(),
            self.height(),
            width,
            height
        );

        let texture = create_texture(device, width, height);
        self.view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let old = std::mem::replace(&mut self.texture, texture);
        self.retired.retire(frame, old);
        true
    }
}

fn create_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("gallery storage texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: STORAGE_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}
