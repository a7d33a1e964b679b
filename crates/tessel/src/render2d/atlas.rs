//! Texture-atlas lookups.
//!
//! Decoding images and uploading textures happen elsewhere; the renderer only
//! needs to turn a tile id into a UV rectangle. [`TileUvLookup`] is that seam.
//! [`AtlasGrid`] covers the common case of a sheet cut into equal square
//! cells, numbered row-major from the top-left:
//!
//! ```text
//! 64×32 sheet, 16 px tiles
//! ┌────┬────┬────┬────┐
//! │ 0  │ 1  │ 2  │ 3  │
//! ├────┼────┼────┼────┤
//! │ 4  │ 5  │ 6  │ 7  │
//! └────┴────┴────┴────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Sprite;
use super::tilemap::TileId;
use crate::error::{Error, Result};
use crate::math::{Rect, Vec2};

/// Resolves a tile id to its UV rectangle in the atlas texture.
pub trait TileUvLookup {
    fn tile_uvs(&self, tile: TileId) -> Option<Rect>;
}

impl TileUvLookup for HashMap<TileId, Rect> {
    fn tile_uvs(&self, tile: TileId) -> Option<Rect> {
        self.get(&tile).copied()
    }
}

impl<T: TileUvLookup + ?Sized> TileUvLookup for &T {
    fn tile_uvs(&self, tile: TileId) -> Option<Rect> {
        (**self).tile_uvs(tile)
    }
}

/// A texture sheet divided into square cells of `tile_size` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasGrid {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
}

impl Default for AtlasGrid {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            tile_size: 16,
        }
    }
}

impl AtlasGrid {
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        Self {
            width,
            height,
            tile_size,
        }
    }

    /// Rejects zero dimensions and sheets smaller than one cell.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 || self.width < self.tile_size || self.height < self.tile_size {
            return Err(Error::InvalidConfig(format!(
                "atlas {}x{} cannot hold {} px tiles",
                self.width, self.height, self.tile_size
            )));
        }
        Ok(())
    }

    pub fn columns(&self) -> u32 {
        self.width.checked_div(self.tile_size).unwrap_or(0)
    }

    pub fn rows(&self) -> u32 {
        self.height.checked_div(self.tile_size).unwrap_or(0)
    }

    /// Number of addressable cells, saturating at `u32::MAX`.
    pub fn capacity(&self) -> u32 {
        self.columns().saturating_mul(self.rows())
    }

    /// UV rect of the `span_x × span_y` block whose top-left cell is
    /// (`tile_u`, `tile_v`). The block may run past the sheet edge; the caller
    /// picks the cells.
    pub fn cell_rect(&self, tile_u: u32, tile_v: u32, span_x: u32, span_y: u32) -> Rect {
        let ts = self.tile_size as f32;
        Rect::from_pixels(
            tile_u as f32 * ts,
            tile_v as f32 * ts,
            span_x as f32 * ts,
            span_y as f32 * ts,
            self.width as f32,
            self.height as f32,
        )
    }

    /// Sprite covering a block of cells, drawn at its native pixel size on
    /// layer 0.
    pub fn sprite(&self, tile_u: u32, tile_v: u32, span_x: u32, span_y: u32) -> Sprite {
        let ts = self.tile_size as f32;
        Sprite {
            uv_rect: self.cell_rect(tile_u, tile_v, span_x, span_y),
            size: Vec2::new(span_x as f32 * ts, span_y as f32 * ts),
            layer: 0,
        }
    }
}

impl TileUvLookup for AtlasGrid {
    fn tile_uvs(&self, tile: TileId) -> Option<Rect> {
        let cols = self.columns();
        if tile >= self.capacity() {
            return None;
        }
        Some(self.cell_rect(tile % cols, tile / cols, 1, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_sheet_capacity_saturates() {
        let atlas = AtlasGrid::new(65536, 65536, 1);
        assert!(atlas.validate().is_ok());
        assert_eq!(atlas.capacity(), u32::MAX);
        assert!(atlas.tile_uvs(70_000).is_some());
    }

    #[test]
    fn cells_are_row_major() {
        let atlas = AtlasGrid::new(64, 32, 16);
        assert_eq!(atlas.capacity(), 8);
        let r = atlas.tile_uvs(5).unwrap();
        assert_eq!(r.min, Vec2::new(0.25, 0.5));
        assert_eq!(r.max, Vec2::new(0.5, 1.0));
    }

    #[test]
    fn out_of_range_tile_is_none() {
        let atlas = AtlasGrid::new(64, 32, 16);
        assert!(atlas.tile_uvs(8).is_none());
        assert!(AtlasGrid::new(0, 0, 0).tile_uvs(0).is_none());
    }

    #[test]
    fn sprite_spans_cells() {
        let atlas = AtlasGrid::default();
        let s = atlas.sprite(1, 2, 2, 1);
        assert_eq!(s.size, Vec2::new(32.0, 16.0));
        assert_eq!(s.uv_rect.min, Vec2::new(16.0 / 256.0, 32.0 / 256.0));
        assert_eq!(s.uv_rect.max, Vec2::new(48.0 / 256.0, 48.0 / 256.0));
    }

    #[test]
    fn validate_rejects_degenerate_sheets() {
        assert!(AtlasGrid::default().validate().is_ok());
        assert!(AtlasGrid::new(64, 64, 0).validate().is_err());
        assert!(AtlasGrid::new(8, 64, 16).validate().is_err());
    }

    #[test]
    fn hashmap_lookup() {
        let mut map: HashMap<TileId, Rect> = HashMap::new();
        map.insert(3, Rect::FULL);
        assert_eq!(map.tile_uvs(3), Some(Rect::FULL));
        assert_eq!(map.tile_uvs(4), None);
    }
}
