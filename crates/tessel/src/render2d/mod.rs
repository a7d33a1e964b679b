//! # Render2d: Tile Layers and Sprites
//!
//! Turns the world's 2D content into a [`FramePlan`] for the draw loop. Two
//! kinds of drawables exist:
//!
//! - **Tile layers**: entities with a [`TileGrid`](tilemap::TileGrid), baked
//!   into cached vertex buffers (see [`tilemap`]).
//! - **Sprites**: entities with a [`Sprite`] and a
//!   [`Position`](crate::math::Position), drawn as a unit quad scaled to the
//!   sprite's size.
//!
//! ## Frame Preparation
//!
//! ```text
//!   Camera2d resource ──▶ view_transform ──────────────────────────┐
//!                                                                  │
//!   (TileGrid) entities, by id                                     ▼
//!     ├─ Uncached / Stale → rebuild → Mesh command      FramePlan { view,
//!     └─ Fresh            → reuse   → Mesh command        commands: [
//!                                                            Mesh, Mesh, ..
//!   (Sprite, Position) entities, by (layer, id)              Sprite, ..
//!     └─ Sprite command                                    ] }
//! ```
//!
//! Tile layers come first so sprites always draw on top of the map. Sprites
//! on a higher layer draw later.

pub mod atlas;
pub mod tilemap;
pub mod vertex;

use serde::{Deserialize, Serialize};

use crate::camera::{Camera2d, view_transform};
use crate::ecs::{Entity, World};
use crate::error::Result;
use crate::math::{Mat4, Position, Rect, Vec2};
use crate::render::{DrawCommand, FramePlan, GpuBackend};
use atlas::TileUvLookup;
use tilemap::{TileGrid, TileMesh};

/// A textured quad: which part of the atlas to sample, how big to draw it
/// (pixels), and which layer it sorts into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub uv_rect: Rect,
    pub size: Vec2,
    pub layer: i32,
}

impl Sprite {
    pub fn new(uv_rect: Rect, size: Vec2) -> Self {
        Self {
            uv_rect,
            size,
            layer: 0,
        }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Model matrix for a unit quad: scale to `size`, then move to `position`.
    pub fn model(&self, position: &Position) -> Mat4 {
        position.matrix() * Mat4::from_scale(self.size.extend(1.0))
    }
}

/// Owns a [`GpuBackend`] and an atlas lookup, and prepares frames from a
/// [`World`].
pub struct Renderer2d<B: GpuBackend, A: TileUvLookup> {
    backend: B,
    atlas: A,
}

impl<B: GpuBackend, A: TileUvLookup> Renderer2d<B, A> {
    pub fn new(backend: B, atlas: A) -> Self {
        Self { backend, atlas }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn atlas(&self) -> &A {
        &self.atlas
    }

    /// Swap the atlas. Every tile layer is marked dirty so it re-bakes its UVs
    /// on the next frame.
    pub fn set_atlas(&mut self, world: &mut World, atlas: A) {
        self.atlas = atlas;
        world.query::<(&mut TileGrid,)>(|_, (grid,)| grid.mark_dirty());
    }

    /// Bring every tile mesh up to date and collect this frame's draws.
    ///
    /// The view comes from the [`Camera2d`] resource, or the default camera
    /// if none is present. An error (bad camera, unknown tile, failed upload)
    /// stops preparation; layers processed before the failure keep their new
    /// meshes.
    pub fn prepare_frame(&mut self, world: &mut World) -> Result<FramePlan<B::Buffer>> {
        let camera = world.get_resource::<Camera2d>().copied().unwrap_or_default();
        let mut plan = FramePlan {
            view: view_transform(&camera)?,
            commands: Vec::new(),
            rebuilt: 0,
            reused: 0,
        };

        tilemap::prepare_tilemaps(world, &mut self.backend, &self.atlas, &mut plan)?;
        plan.commands.extend(sprite_commands(world));

        log::trace!(
            "frame plan: {} commands, {} rebuilt, {} reused",
            plan.commands.len(),
            plan.rebuilt,
            plan.reused
        );
        Ok(plan)
    }

    /// Release `entity`'s tile mesh. See [`tilemap::dispose_tile_mesh`].
    pub fn dispose(&mut self, world: &mut World, entity: Entity) -> bool {
        tilemap::dispose_tile_mesh(world, &mut self.backend, entity)
    }

    /// Release the layer's mesh and destroy the entity.
    pub fn retire_layer(&mut self, world: &mut World, entity: Entity) -> Result<()> {
        tilemap::retire_layer(world, &mut self.backend, entity)
    }

    /// Release every tile mesh in the world, e.g. before dropping the device.
    /// Returns how many were released.
    pub fn dispose_all(&mut self, world: &mut World) -> usize {
        let meshes: Vec<Entity> = world.iter::<TileMesh<B::Buffer>>().map(|(e, _)| e).collect();
        meshes
            .into_iter()
            .filter(|&e| tilemap::dispose_tile_mesh(world, &mut self.backend, e))
            .count()
    }
}

fn sprite_commands<H>(world: &World) -> Vec<DrawCommand<H>> {
    let mut sprites: Vec<(i32, Entity, Sprite, Position)> = world
        .query_entities_of::<(Sprite, Position)>()
        .into_iter()
        .filter_map(|e| {
            let sprite = *world.get::<Sprite>(e)?;
            let position = *world.get::<Position>(e)?;
            Some((sprite.layer, e, sprite, position))
        })
        .collect();
    sprites.sort_unstable_by_key(|&(layer, entity, ..)| (layer, entity));

    sprites
        .into_iter()
        .map(|(layer, entity, sprite, position)| DrawCommand::Sprite {
            entity,
            model: sprite.model(&position),
            uv_rect: sprite.uv_rect,
            size: sprite.size,
            layer,
        })
        .collect()
}
