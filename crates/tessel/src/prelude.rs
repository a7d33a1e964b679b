//! Convenience re-exports: `use tessel::prelude::*` for the common items.

pub use crate::camera::{Camera2d, view_transform};
pub use crate::config::EngineConfig;
pub use crate::ecs::{ComponentKind, Entity, Schedule, System, World};
pub use crate::error::{Error, Result};
pub use crate::input::{Input, KeyCode};
pub use crate::math::{Mat4, Position, Rect, Vec2, Vec3, Vec4};
pub use crate::movement::{PlayerInput, player_movement};
pub use crate::render::{DrawCommand, FramePlan, GpuBackend, GpuContext, HeadlessBackend, WgpuBackend};
pub use crate::render2d::atlas::{AtlasGrid, TileUvLookup};
pub use crate::render2d::tilemap::{CacheState, EMPTY_TILE, TileGrid, TileId, TileMesh};
pub use crate::render2d::{Renderer2d, Sprite};
pub use crate::time::Time;
