//! Resource builders: buffers, shader modules and shader sources.

use std::path::Path;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use crate::error::GalleryError;

/// Allocates a buffer sized to `data` and fills it through a mapped-at-creation copy.
///
/// The buffer content equals the bytes of `data`; the allocation is padded up to
/// wgpu's copy alignment. Empty input yields an empty buffer.
pub fn create_buffer_from_data<T: Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &[T],
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage,
    })
}

/// Compiles WGSL source into a shader module.
///
/// Syntax errors are reported by wgpu's validation, not here.
pub fn create_shader_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

/// Reads shader source text from disk.
pub fn load_shader_source(path: impl AsRef<Path>) -> Result<String, GalleryError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| GalleryError::ShaderNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded shader {} ({} bytes)", path.display(), source.len());
    Ok(source)
}

/// Copies `buffer` into a staging buffer and returns its bytes.
///
/// `buffer` must have been created with `COPY_SRC`. Blocks until the GPU is done.
pub fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
) -> Result<Vec<u8>, GalleryError> {
    let size = buffer.size();
    if size == 0 {
        return Ok(Vec::new());
    }

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("gallery read-back staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("gallery read-back encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| GalleryError::Readback(e.to_string()))?;
    rx.recv()
        .map_err(|e| GalleryError::Readback(e.to_string()))?
        .map_err(|e| GalleryError::Readback(e.to_string()))?;

    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(bytes)
}

/// Number of workgroups of `workgroup_size` needed to cover `items` work items.
#[inline]
pub fn workgroup_count(items: u32, workgroup_size: u32) -> u32 {
    items.div_ceil(workgroup_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroups_cover_all_items() {
        assert_eq!(workgroup_count(0, 64), 0);
        assert_eq!(workgroup_count(1, 64), 1);
        assert_eq!(workgroup_count(64, 64), 1);
        assert_eq!(workgroup_count(1024, 64), 16);
        assert_eq!(workgroup_count(1025, 64), 17);
        assert_eq!(workgroup_count(801, 8), 101);
    }

    #[test]
    fn missing_shader_is_resource_not_found() {
        let err = load_shader_source("definitely/not/here.wgsl").unwrap_err();
        match err {
            GalleryError::ShaderNotFound { path, source } => {
                assert_eq!(path, Path::new("definitely/not/here.wgsl"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shader_source_is_read_verbatim() {
        let path = std::env::temp_dir().join(format!("gallery-shader-{}.wgsl", std::process::id()));
        std::fs::write(&path, "@compute @workgroup_size(1) fn main() {}\n").unwrap();
        let source = load_shader_source(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(source, "@compute @workgroup_size(1) fn main() {}\n");
    }
}
