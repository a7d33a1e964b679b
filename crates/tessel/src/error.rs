//! Crate-wide error type.
//!
//! Misuse by the caller (addressing a dead entity, a camera with a
//! non-positive zoom) is rejected at the call site. Absence is not an error:
//! [`World::get`](crate::ecs::World::get) and friends return `None` or an
//! empty iterator instead.

use crate::ecs::Entity;
use crate::render2d::tilemap::TileId;

/// Everything that can go wrong in tessel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The entity was never created by this world, or has been destroyed.
    #[error("entity {0} does not exist in this world")]
    InvalidEntity(Entity),

    /// A camera zoom that is zero, negative, or not a finite number.
    #[error("invalid camera state: zoom must be positive and finite, got {zoom}")]
    InvalidCameraState { zoom: f32 },

    /// A direct lookup found nothing where a query should have guaranteed a
    /// component. Indicates a query/consumption mismatch.
    #[error("entity {entity} has no `{component}` component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    /// The texture atlas has no cell for this tile id.
    #[error("tile id {tile} has no entry in the texture atlas")]
    UnknownTile { tile: TileId },

    /// Tile rows passed to a grid constructor had different lengths.
    #[error("tile grid row {row} has {found} columns, expected {expected}")]
    RaggedTileGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// No usable GPU adapter or device.
    #[error("gpu initialisation failed: {0}")]
    GpuInit(String),

    /// Creating a vertex buffer failed (usually memory exhaustion).
    #[error("gpu upload failed: {0}")]
    GpuUpload(String),

    /// Configuration parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shorthand for `Result<T, tessel::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
