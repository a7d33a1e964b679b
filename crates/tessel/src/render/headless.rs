//! In-memory [`GpuBackend`].
//!
//! Keeps every live buffer's vertices in a map so callers can inspect what
//! would have reached the GPU, and counts uploads and releases. An optional
//! live-buffer limit makes uploads fail the way an exhausted device would.

use std::collections::HashMap;

use super::GpuBackend;
use crate::error::{Error, Result};
use crate::render2d::vertex::TileVertex;

/// Handle to a buffer held by a [`HeadlessBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessBuffer(u64);

impl HeadlessBuffer {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    live: HashMap<HeadlessBuffer, Vec<TileVertex>>,
    uploads: usize,
    releases: usize,
    limit: Option<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads once `limit` buffers are live.
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn set_buffer_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    /// Vertices of a live buffer, `None` once released.
    pub fn contents(&self, buffer: HeadlessBuffer) -> Option<&[TileVertex]> {
        self.live.get(&buffer).map(Vec::as_slice)
    }

    pub fn is_live(&self, buffer: HeadlessBuffer) -> bool {
        self.live.contains_key(&buffer)
    }

    pub fn live_buffers(&self) -> usize {
        self.live.len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    pub fn release_count(&self) -> usize {
        self.releases
    }
}

impl GpuBackend for HeadlessBackend {
    type Buffer = HeadlessBuffer;

    fn upload_vertices(&mut self, label: &str, vertices: &[TileVertex]) -> Result<HeadlessBuffer> {
        if let Some(limit) = self.limit
            && self.live.len() >= limit
        {
            return Err(Error::GpuUpload(format!(
                "`{label}`: out of memory ({limit} buffers live)"
            )));
        }
        let buffer = HeadlessBuffer(self.next_id);
        self.next_id += 1;
        self.live.insert(buffer, vertices.to_vec());
        self.uploads += 1;
        Ok(buffer)
    }

    fn release(&mut self, buffer: &HeadlessBuffer) {
        if self.live.remove(buffer).is_some() {
            self.releases += 1;
        } else {
            log::warn!("release of unknown or already released buffer {}", buffer.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    #[test]
    fn upload_release_bookkeeping() {
        let mut gpu = HeadlessBackend::new();
        let verts = [TileVertex::new(Vec2::ZERO, Vec2::ONE)];
        let a = gpu.upload_vertices("a", &verts).unwrap();
        let b = gpu.upload_vertices("b", &[]).unwrap();
        assert_ne!(a, b);
        assert_eq!(gpu.contents(a), Some(&verts[..]));
        assert_eq!(gpu.live_buffers(), 2);

        gpu.release(&a);
        assert!(!gpu.is_live(a));
        assert!(gpu.contents(a).is_none());
        assert_eq!(gpu.upload_count(), 2);
        assert_eq!(gpu.release_count(), 1);
    }

    #[test]
    fn double_release_is_counted_once() {
        let mut gpu = HeadlessBackend::new();
        let a = gpu.upload_vertices("a", &[]).unwrap();
        gpu.release(&a);
        gpu.release(&a);
        assert_eq!(gpu.release_count(), 1);
    }

    #[test]
    fn limit_simulates_exhaustion() {
        let mut gpu = HeadlessBackend::new().with_buffer_limit(1);
        let a = gpu.upload_vertices("a", &[]).unwrap();
        assert!(matches!(
            gpu.upload_vertices("b", &[]),
            Err(Error::GpuUpload(_))
        ));
        gpu.release(&a);
        assert!(gpu.upload_vertices("c", &[]).is_ok());
    }
}
