//! # Render: Backend Seam and Frame Plan
//!
//! The renderer never talks to a graphics API directly. It uploads baked
//! vertices through the [`GpuBackend`] trait and hands the external draw loop
//! a [`FramePlan`]: the camera's view matrix plus an ordered list of
//! [`DrawCommand`]s.
//!
//! ```text
//!   Renderer2d::prepare_frame(world)
//!        │
//!        ├─ rebuild stale tile meshes ──▶ GpuBackend::upload_vertices / release
//!        │
//!        ▼
//!   FramePlan { view, commands: [Mesh.., Sprite..] } ──▶ draw loop
//! ```
//!
//! Two backends ship with the crate:
//!
//! - [`gpu::WgpuBackend`]: real vertex buffers on a wgpu device.
//! - [`headless::HeadlessBackend`]: in-memory buffers for tests and tools.

pub mod gpu;
pub mod headless;

use crate::ecs::Entity;
use crate::error::Result;
use crate::math::{Mat4, Rect, Vec2};
use crate::render2d::vertex::TileVertex;

pub use gpu::{GpuContext, WgpuBackend};
pub use headless::{HeadlessBackend, HeadlessBuffer};

/// Where baked vertex data goes.
///
/// A buffer returned by [`upload_vertices`](Self::upload_vertices) is owned
/// by whoever stores it (a [`TileMesh`](crate::render2d::tilemap::TileMesh))
/// until it is handed back to [`release`](Self::release).
pub trait GpuBackend {
    /// Handle to an uploaded vertex buffer.
    type Buffer: Clone + Send + Sync + 'static;

    /// Upload `vertices` into a new buffer. Fails with
    /// [`Error::GpuUpload`](crate::Error::GpuUpload) when the device can't
    /// allocate it.
    fn upload_vertices(&mut self, label: &str, vertices: &[TileVertex]) -> Result<Self::Buffer>;

    /// Free a buffer. The handle must not be used afterwards.
    fn release(&mut self, buffer: &Self::Buffer);
}

/// One thing to draw this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand<H> {
    /// A baked tile layer. Vertices are already in the layer's local space
    /// with final atlas UVs.
    Mesh {
        entity: Entity,
        model: Mat4,
        buffer: H,
        vertex_count: u32,
    },
    /// A single textured quad of `size` pixels, sampling `uv_rect` of the
    /// atlas.
    Sprite {
        entity: Entity,
        model: Mat4,
        uv_rect: Rect,
        size: Vec2,
        layer: i32,
    },
}

impl<H> DrawCommand<H> {
    pub fn entity(&self) -> Entity {
        match self {
            DrawCommand::Mesh { entity, .. } | DrawCommand::Sprite { entity, .. } => *entity,
        }
    }

    pub fn model(&self) -> Mat4 {
        match self {
            DrawCommand::Mesh { model, .. } | DrawCommand::Sprite { model, .. } => *model,
        }
    }

    /// Whether the shader should remap the unit quad's UVs into a sub-rect.
    /// Baked meshes carry final UVs per vertex, sprites don't.
    pub fn remap_uvs(&self) -> bool {
        matches!(self, DrawCommand::Sprite { .. })
    }
}

/// Everything the draw loop needs for one frame.
#[derive(Debug, Clone)]
pub struct FramePlan<H> {
    /// Camera view matrix, applied to every command.
    pub view: Mat4,
    /// Tile meshes first, then sprites by layer.
    pub commands: Vec<DrawCommand<H>>,
    /// Meshes rebuilt during this frame's preparation.
    pub rebuilt: usize,
    /// Meshes drawn from cache.
    pub reused: usize,
}

impl<H> FramePlan<H> {
    pub fn meshes(&self) -> impl Iterator<Item = &DrawCommand<H>> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Mesh { .. }))
    }

    pub fn sprites(&self) -> impl Iterator<Item = &DrawCommand<H>> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Sprite { .. }))
    }
}
