//! GPU context and the wgpu vertex-buffer backend.
//!
//! [`GpuContext`] wraps the wgpu device and queue. The window layer usually
//! creates them alongside its surface and passes them in with
//! [`GpuContext::from_parts`]; tools without a window use
//! [`GpuContext::new_headless`].

use wgpu::util::DeviceExt;

use super::GpuBackend;
use crate::error::{Error, Result};
use crate::render2d::vertex::TileVertex;

/// Wraps the wgpu device and queue.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Request an adapter without a surface and create a device on it.
    /// Blocks until the adapter answers.
    pub fn new_headless() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| Error::GpuInit(e.to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("tessel device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| Error::GpuInit(e.to_string()))?;

        log::info!("gpu ready: {}", adapter.get_info().name);
        Ok(Self { device, queue })
    }

    /// Wrap a device and queue created elsewhere.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

/// [`GpuBackend`] that creates real wgpu vertex buffers.
pub struct WgpuBackend {
    device: wgpu::Device,
}

impl WgpuBackend {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            device: gpu.device.clone(),
        }
    }
}

impl GpuBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;

    fn upload_vertices(&mut self, label: &str, vertices: &[TileVertex]) -> Result<wgpu::Buffer> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        check_buffer_size(label, bytes.len() as u64, self.device.limits().max_buffer_size)?;

        // Catch both so a bad buffer surfaces as an error instead of reaching
        // the uncaptured-error handler, which panics.
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        if let Some(err) = validation.or(out_of_memory) {
            buffer.destroy();
            return Err(Error::GpuUpload(format!("`{label}`: {err}")));
        }
        Ok(buffer)
    }

    fn release(&mut self, buffer: &wgpu::Buffer) {
        buffer.destroy();
    }
}

/// Reject uploads the device can never hold before asking it to.
fn check_buffer_size(label: &str, bytes: u64, max: u64) -> Result<()> {
    if bytes > max {
        return Err(Error::GpuUpload(format!(
            "`{label}`: {bytes} bytes exceeds the device limit of {max}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_upload_is_an_error() {
        let max = wgpu::Limits::default().max_buffer_size;
        // 3M tiles, six 16-byte vertices each
        let bytes = 3_000_000 * 6 * 16;
        let err = check_buffer_size("tile mesh #0", bytes, max).unwrap_err();
        assert!(matches!(err, Error::GpuUpload(msg) if msg.contains("tile mesh #0")));
    }

    #[test]
    fn upload_at_limit_is_allowed() {
        assert!(check_buffer_size("a", 256, 256).is_ok());
        assert!(check_buffer_size("a", 0, 256).is_ok());
    }
}
