//! # Tilemap: Grids Baked into Cached Vertex Buffers
//!
//! A tile layer is an entity with a [`TileGrid`]. Drawing a grid tile by tile
//! every frame would mean thousands of quads; instead the whole layer is baked
//! into one vertex buffer, attached to the entity as a [`TileMesh`], and
//! reused until the grid changes.
//!
//! ## Cache States
//!
//! ```text
//!                   rebuild                       grid mutated
//!   ┌──────────┐ ───────────▶ ┌─────────┐ ─────────────────────▶ ┌─────────┐
//!   │ Uncached │              │  Fresh  │                        │  Stale  │
//!   │ no mesh  │              │ mesh,   │ ◀───────────────────── │ mesh,   │
//!   └──────────┘              │ !dirty  │        rebuild         │ dirty   │
//!        ▲                    └─────────┘                        └─────────┘
//!        │        dispose_tile_mesh               │
//!        └────────────────────────────────────────┘
//! ```
//!
//! The dirty flag lives on the grid. Every grid mutator sets it; only a
//! successful rebuild clears it. A rebuild is always full:
//!
//! 1. read the grid, emit six vertices per non-empty tile
//! 2. upload them into a new buffer
//! 3. release the buffer of the previous mesh, if any
//! 4. attach the new [`TileMesh`]
//! 5. clear the dirty flag
//!
//! If step 1 or 2 fails the error propagates, the grid stays dirty and the
//! previous mesh is left as it was, so the next frame retries.
//!
//! ## Buffer Ownership
//!
//! A buffer belongs to the [`TileMesh`] holding it. It is released when the
//! mesh is replaced by a rebuild or disposed with [`dispose_tile_mesh`].
//!
//! Every uploaded handle is also recorded in a [`MeshOwners`] resource. If a
//! mesh disappears without being disposed (its entity was destroyed, or the
//! component was removed by hand), [`reclaim_orphaned_meshes`] finds the
//! ledger entry with no mesh behind it and releases the buffer. Frame
//! preparation runs it first, so such a buffer lives at most until the next
//! frame.

use std::collections::HashMap;

use super::atlas::TileUvLookup;
use super::vertex::{TileVertex, push_quad};
use crate::ecs::{Entity, World};
use crate::error::{Error, Result};
use crate::math::{Mat4, Position, Vec2};
use crate::render::{DrawCommand, FramePlan, GpuBackend};

/// Index of a cell in the texture atlas.
pub type TileId = u32;

/// Tile id meaning "nothing here". Empty tiles produce no geometry.
pub const EMPTY_TILE: TileId = 0;

/// A row-major grid of tile ids with a fixed tile size in world units.
///
/// Tile `(col, row)` covers `[col*w, col*w + w] × [row*h, row*h + h]` in the
/// layer's local space, with rows growing downward.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    columns: usize,
    rows: usize,
    tiles: Vec<TileId>,
    tile_size: Vec2,
    dirty: bool,
}

impl TileGrid {
    /// An all-empty grid. New grids start dirty.
    pub fn new(columns: usize, rows: usize, tile_size: Vec2) -> Self {
        Self {
            columns,
            rows,
            tiles: vec![EMPTY_TILE; columns * rows],
            tile_size,
            dirty: true,
        }
    }

    /// Build from rows of tile ids, top row first. Every row must have the
    /// same length.
    pub fn from_rows(rows: Vec<Vec<TileId>>, tile_size: Vec2) -> Result<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        for (row, tiles) in rows.iter().enumerate() {
            if tiles.len() != columns {
                return Err(Error::RaggedTileGrid {
                    row,
                    expected: columns,
                    found: tiles.len(),
                });
            }
        }
        Ok(Self {
            columns,
            rows: rows.len(),
            tiles: rows.into_iter().flatten().collect(),
            tile_size,
            dirty: true,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    /// `None` outside the grid.
    pub fn tile(&self, col: usize, row: usize) -> Option<TileId> {
        self.index(col, row).map(|i| self.tiles[i])
    }

    /// Replace one tile and return the previous id, or `None` if `(col, row)`
    /// is outside the grid. Marks the grid dirty only when the id actually
    /// changes.
    pub fn set_tile(&mut self, col: usize, row: usize, tile: TileId) -> Option<TileId> {
        let i = self.index(col, row)?;
        let old = std::mem::replace(&mut self.tiles[i], tile);
        if old != tile {
            self.dirty = true;
        }
        Some(old)
    }

    /// Set every tile to `tile`.
    pub fn fill(&mut self, tile: TileId) {
        self.tiles.fill(tile);
        self.dirty = true;
    }

    /// `(col, row, tile)` for every cell, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, TileId)> + '_ {
        let columns = self.columns.max(1);
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, &t)| (i % columns, i / columns, t))
    }

    pub fn non_empty_count(&self) -> usize {
        self.tiles.iter().filter(|&&t| t != EMPTY_TILE).count()
    }

    /// Force a rebuild on the next frame, e.g. after the atlas changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.columns && row < self.rows).then(|| row * self.columns + col)
    }
}

/// Derived render data for a [`TileGrid`]: the uploaded buffer and how many
/// vertices it holds. Only [`rebuild_tile_mesh`] creates one.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMesh<H> {
    buffer: H,
    vertex_count: u32,
}

impl<H> TileMesh<H> {
    pub fn buffer(&self) -> &H {
        &self.buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// World resource: which entity owns each live tile-mesh buffer.
///
/// Kept in step with the [`TileMesh`] components by [`rebuild_tile_mesh`] and
/// [`dispose_tile_mesh`].
#[derive(Debug)]
pub struct MeshOwners<H> {
    buffers: HashMap<Entity, H>,
}

impl<H> MeshOwners<H> {
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn owns(&self, entity: Entity) -> bool {
        self.buffers.contains_key(&entity)
    }
}

impl<H> Default for MeshOwners<H> {
    fn default() -> Self {
        Self {
            buffers: HashMap::new(),
        }
    }
}

fn owners_mut<H: Send + Sync + 'static>(world: &mut World) -> &mut MeshOwners<H> {
    if !world.has_resource::<MeshOwners<H>>() {
        world.insert_resource(MeshOwners::<H>::default());
    }
    world.resource_mut::<MeshOwners<H>>()
}

/// Where an entity's tile mesh stands relative to its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No mesh attached yet.
    Uncached,
    /// Mesh matches the grid.
    Fresh,
    /// Mesh exists but the grid changed since it was built.
    Stale,
}

impl CacheState {
    pub fn needs_rebuild(self) -> bool {
        !matches!(self, CacheState::Fresh)
    }
}

/// Cache state of `entity`'s tile layer, `None` if it has no [`TileGrid`].
pub fn cache_state<H: Send + Sync + 'static>(world: &World, entity: Entity) -> Option<CacheState> {
    let grid = world.get::<TileGrid>(entity)?;
    let state = match (world.has::<TileMesh<H>>(entity), grid.is_dirty()) {
        (false, _) => CacheState::Uncached,
        (true, false) => CacheState::Fresh,
        (true, true) => CacheState::Stale,
    };
    Some(state)
}

/// Two triangles per non-empty tile, in grid order.
pub fn build_tile_vertices(grid: &TileGrid, atlas: &impl TileUvLookup) -> Result<Vec<TileVertex>> {
    let size = grid.tile_size();
    let mut out = Vec::with_capacity(grid.non_empty_count() * 6);
    for (col, row, tile) in grid.iter() {
        if tile == EMPTY_TILE {
            continue;
        }
        let uv = atlas.tile_uvs(tile).ok_or(Error::UnknownTile { tile })?;
        let origin = Vec2::new(col as f32 * size.x, row as f32 * size.y);
        push_quad(&mut out, origin, size, uv);
    }
    Ok(out)
}

/// Bake `entity`'s grid into a fresh buffer and attach it, replacing and
/// releasing any previous mesh. Returns the new vertex count.
pub fn rebuild_tile_mesh<B: GpuBackend>(
    world: &mut World,
    backend: &mut B,
    atlas: &impl TileUvLookup,
    entity: Entity,
) -> Result<u32> {
    let vertices = build_tile_vertices(world.component::<TileGrid>(entity)?, atlas)?;
    let vertex_count = vertices.len() as u32;
    let buffer = backend.upload_vertices(&format!("tile mesh {entity}"), &vertices)?;

    if let Some(old) = world.get::<TileMesh<B::Buffer>>(entity) {
        backend.release(&old.buffer);
    }
    owners_mut::<B::Buffer>(world)
        .buffers
        .insert(entity, buffer.clone());
    world.set(
        entity,
        TileMesh {
            buffer,
            vertex_count,
        },
    )?;
    world.component_mut::<TileGrid>(entity)?.clear_dirty();

    log::debug!("rebuilt tile mesh for {entity:?}: {vertex_count} vertices");
    Ok(vertex_count)
}

/// Run the cache protocol for every tile layer and append one mesh draw per
/// layer to `plan`, in entity order. Layers with a [`Position`] are drawn
/// translated to it.
pub fn prepare_tilemaps<B: GpuBackend>(
    world: &mut World,
    backend: &mut B,
    atlas: &impl TileUvLookup,
    plan: &mut FramePlan<B::Buffer>,
) -> Result<()> {
    reclaim_orphaned_meshes(world, backend);

    let mut layers: Vec<Entity> = world.query_entities_of::<(TileGrid,)>().into_iter().collect();
    layers.sort_unstable();

    for entity in layers {
        let state = cache_state::<B::Buffer>(world, entity).unwrap_or(CacheState::Uncached);
        if state.needs_rebuild() {
            rebuild_tile_mesh(world, backend, atlas, entity)?;
            plan.rebuilt += 1;
        } else {
            log::trace!("reusing tile mesh for {entity:?}");
            plan.reused += 1;
        }

        let mesh = world.component::<TileMesh<B::Buffer>>(entity)?;
        let model = world
            .get::<Position>(entity)
            .map_or(Mat4::IDENTITY, Position::matrix);
        plan.commands.push(DrawCommand::Mesh {
            entity,
            model,
            buffer: mesh.buffer.clone(),
            vertex_count: mesh.vertex_count,
        });
    }
    Ok(())
}

/// Release `entity`'s mesh buffer, then detach the mesh. Returns whether
/// there was one. The grid is kept; the next frame treats it as uncached.
pub fn dispose_tile_mesh<B: GpuBackend>(world: &mut World, backend: &mut B, entity: Entity) -> bool {
    let Some(mesh) = world.get::<TileMesh<B::Buffer>>(entity) else {
        return false;
    };
    backend.release(&mesh.buffer);
    world.remove::<TileMesh<B::Buffer>>(entity);
    owners_mut::<B::Buffer>(world).buffers.remove(&entity);
    log::info!("disposed tile mesh for {entity:?}");
    true
}

/// Release every recorded buffer whose mesh is gone without having been
/// disposed: the entity was destroyed, or its [`TileMesh`] was removed
/// directly. Returns how many buffers were released.
pub fn reclaim_orphaned_meshes<B: GpuBackend>(world: &mut World, backend: &mut B) -> usize {
    let Some(mut owners) = world.resource_remove::<MeshOwners<B::Buffer>>() else {
        return 0;
    };
    let before = owners.buffers.len();
    owners.buffers.retain(|&entity, buffer| {
        if world.has::<TileMesh<B::Buffer>>(entity) {
            return true;
        }
        log::warn!("tile mesh of {entity:?} dropped without dispose; releasing its buffer");
        backend.release(buffer);
        false
    });
    let released = before - owners.buffers.len();
    world.insert_resource(owners);
    released
}

/// Dispose the layer's mesh, then destroy the entity.
pub fn retire_layer<B: GpuBackend>(world: &mut World, backend: &mut B, entity: Entity) -> Result<()> {
    if !world.is_alive(entity) {
        return Err(Error::InvalidEntity(entity));
    }
    dispose_tile_mesh(world, backend, entity);
    world.destroy(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{HeadlessBackend, HeadlessBuffer};
    use crate::render2d::atlas::AtlasGrid;

    type Mesh = TileMesh<HeadlessBuffer>;

    fn atlas() -> AtlasGrid {
        AtlasGrid::new(64, 64, 16)
    }

    fn diagonal() -> TileGrid {
        TileGrid::from_rows(vec![vec![1, 0], vec![0, 1]], Vec2::splat(16.0)).unwrap()
    }

    fn layer(world: &mut World, grid: TileGrid) -> Entity {
        let e = world.create();
        world.set(e, grid).unwrap();
        e
    }

    fn plan() -> FramePlan<HeadlessBuffer> {
        FramePlan {
            view: Mat4::IDENTITY,
            commands: Vec::new(),
            rebuilt: 0,
            reused: 0,
        }
    }

    #[test]
    fn from_rows_rejects_ragged() {
        let err = TileGrid::from_rows(vec![vec![1, 2], vec![3]], Vec2::ONE).unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedTileGrid {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn set_tile_marks_dirty_only_on_change() {
        let mut grid = diagonal();
        grid.clear_dirty();
        assert_eq!(grid.set_tile(0, 0, 1), Some(1));
        assert!(!grid.is_dirty());
        assert_eq!(grid.set_tile(1, 0, 2), Some(0));
        assert!(grid.is_dirty());
        assert_eq!(grid.set_tile(5, 0, 2), None);
        assert_eq!(grid.tile(1, 0), Some(2));
        assert_eq!(grid.tile(2, 0), None);
    }

    #[test]
    fn diagonal_grid_has_two_quads() {
        let verts = build_tile_vertices(&diagonal(), &atlas()).unwrap();
        assert_eq!(verts.len(), 12);
        assert_eq!(verts[0].position, [0.0, 0.0]);
        assert_eq!(verts[6].position, [16.0, 16.0]);
        assert_eq!(verts[8].position, [32.0, 32.0]);
    }

    #[test]
    fn empty_grid_bakes_nothing() {
        let grid = TileGrid::new(3, 3, Vec2::ONE);
        assert!(build_tile_vertices(&grid, &atlas()).unwrap().is_empty());
    }

    #[test]
    fn unknown_tile_fails_and_keeps_dirty() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let grid = TileGrid::from_rows(vec![vec![99]], Vec2::ONE).unwrap();
        let e = layer(&mut world, grid);

        let err = rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap_err();
        assert!(matches!(err, Error::UnknownTile { tile: 99 }));
        assert!(world.get::<TileGrid>(e).unwrap().is_dirty());
        assert_eq!(gpu.upload_count(), 0);
        assert_eq!(cache_state::<HeadlessBuffer>(&world, e), Some(CacheState::Uncached));
    }

    #[test]
    fn dirty_round_trip() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());
        assert_eq!(cache_state::<HeadlessBuffer>(&world, e), Some(CacheState::Uncached));

        let mut first = plan();
        prepare_tilemaps(&mut world, &mut gpu, &atlas(), &mut first).unwrap();
        assert_eq!((first.rebuilt, first.reused), (1, 0));
        assert_eq!(cache_state::<HeadlessBuffer>(&world, e), Some(CacheState::Fresh));
        assert!(!world.get::<TileGrid>(e).unwrap().is_dirty());

        let mut second = plan();
        prepare_tilemaps(&mut world, &mut gpu, &atlas(), &mut second).unwrap();
        assert_eq!((second.rebuilt, second.reused), (0, 1));
        assert_eq!(gpu.upload_count(), 1);
        assert_eq!(first.commands, second.commands);
    }

    #[test]
    fn mutation_makes_stale_then_rebuilds() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());
        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();

        world.get_mut::<TileGrid>(e).unwrap().set_tile(1, 0, 3);
        assert_eq!(cache_state::<HeadlessBuffer>(&world, e), Some(CacheState::Stale));

        let count = rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();
        assert_eq!(count, 18);
        assert_eq!(cache_state::<HeadlessBuffer>(&world, e), Some(CacheState::Fresh));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());

        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();
        let a = *world.get::<Mesh>(e).unwrap().buffer();
        let a_verts = gpu.contents(a).unwrap().to_vec();

        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();
        let mesh = world.get::<Mesh>(e).unwrap();
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(gpu.contents(*mesh.buffer()).unwrap(), &a_verts[..]);
    }

    #[test]
    fn rebuild_releases_previous_buffer() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());

        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();
        let old = *world.get::<Mesh>(e).unwrap().buffer();
        world.get_mut::<TileGrid>(e).unwrap().fill(2);
        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();

        assert!(!gpu.is_live(old));
        assert_eq!(gpu.live_buffers(), 1);
        assert_eq!(gpu.release_count(), 1);
    }

    #[test]
    fn failed_upload_keeps_old_mesh_and_dirty_flag() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new().with_buffer_limit(1);
        let e = layer(&mut world, diagonal());
        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();
        let before = world.get::<Mesh>(e).unwrap().clone();

        world.get_mut::<TileGrid>(e).unwrap().set_tile(1, 0, 1);
        let mut frame = plan();
        let err = prepare_tilemaps(&mut world, &mut gpu, &atlas(), &mut frame).unwrap_err();

        assert!(matches!(err, Error::GpuUpload(_)));
        assert!(world.get::<TileGrid>(e).unwrap().is_dirty());
        assert_eq!(world.get::<Mesh>(e), Some(&before));
        assert!(gpu.is_live(*before.buffer()));
        assert!(frame.commands.is_empty());
    }

    #[test]
    fn dispose_releases_then_removes() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());
        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();

        assert!(dispose_tile_mesh(&mut world, &mut gpu, e));
        assert_eq!(gpu.live_buffers(), 0);
        assert!(!world.has::<Mesh>(e));
        assert!(!dispose_tile_mesh(&mut world, &mut gpu, e));
        assert_eq!(cache_state::<HeadlessBuffer>(&world, e), Some(CacheState::Uncached));
    }

    #[test]
    fn retire_layer_frees_and_destroys() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());
        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();

        retire_layer(&mut world, &mut gpu, e).unwrap();
        assert_eq!(gpu.live_buffers(), 0);
        assert!(!world.is_alive(e));
        assert!(world.query_entities_of::<(TileGrid,)>().is_empty());
        assert!(matches!(
            retire_layer(&mut world, &mut gpu, e),
            Err(Error::InvalidEntity(_))
        ));
    }

    #[test]
    fn destroyed_layer_buffer_released_next_frame() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());
        let kept = layer(&mut world, diagonal());
        prepare_tilemaps(&mut world, &mut gpu, &atlas(), &mut plan()).unwrap();
        assert_eq!(gpu.live_buffers(), 2);

        world.destroy(e).unwrap();
        let mut frame = plan();
        prepare_tilemaps(&mut world, &mut gpu, &atlas(), &mut frame).unwrap();

        assert_eq!(gpu.live_buffers(), 1);
        assert_eq!(gpu.release_count(), 1);
        assert_eq!(frame.reused, 1);
        let owners = world.resource::<MeshOwners<HeadlessBuffer>>();
        assert!(!owners.owns(e));
        assert!(owners.owns(kept));
    }

    #[test]
    fn removed_mesh_component_is_reclaimed_once() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());
        rebuild_tile_mesh(&mut world, &mut gpu, &atlas(), e).unwrap();

        world.remove::<Mesh>(e);
        assert_eq!(reclaim_orphaned_meshes(&mut world, &mut gpu), 1);
        assert_eq!(reclaim_orphaned_meshes(&mut world, &mut gpu), 0);
        assert_eq!(gpu.live_buffers(), 0);
        assert_eq!(gpu.release_count(), 1);
    }

    #[test]
    fn disposed_and_retired_meshes_are_not_released_twice() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let a = layer(&mut world, diagonal());
        let b = layer(&mut world, diagonal());
        prepare_tilemaps(&mut world, &mut gpu, &atlas(), &mut plan()).unwrap();

        dispose_tile_mesh(&mut world, &mut gpu, a);
        retire_layer(&mut world, &mut gpu, b).unwrap();
        assert_eq!(reclaim_orphaned_meshes(&mut world, &mut gpu), 0);
        assert_eq!(gpu.release_count(), 2);
        assert!(world.resource::<MeshOwners<HeadlessBuffer>>().is_empty());
    }

    #[test]
    fn positioned_layer_gets_translated_model() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let e = layer(&mut world, diagonal());
        world.set(e, Position::new(100.0, 50.0)).unwrap();

        let mut frame = plan();
        prepare_tilemaps(&mut world, &mut gpu, &atlas(), &mut frame).unwrap();
        assert_eq!(frame.commands[0].model(), Position::new(100.0, 50.0).matrix());
    }

    #[test]
    fn layers_are_planned_in_entity_order() {
        let mut world = World::new();
        let mut gpu = HeadlessBackend::new();
        let layers: Vec<Entity> = (0..4).map(|_| layer(&mut world, diagonal())).collect();

        let mut frame = plan();
        prepare_tilemaps(&mut world, &mut gpu, &atlas(), &mut frame).unwrap();
        let planned: Vec<Entity> = frame.commands.iter().map(DrawCommand::entity).collect();
        assert_eq!(planned, layers);
        assert_eq!(frame.rebuilt, 4);
    }
}
