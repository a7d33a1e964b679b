//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Position`] places an entity in world space;
//! [`Rect`] selects a region of a texture.

pub use glam::{Mat4, Vec2, Vec3, Vec4};

use serde::{Deserialize, Serialize};

/// World-space position of an entity. Y grows downward, matching the tile
/// grid's row order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    /// Model matrix translating to this position.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.0.extend(0.0))
    }
}

/// A normalized rectangle within a texture (UV space, 0.0–1.0).
///
/// Coordinates are in UV space where (0,0) is the top-left corner and (1,1)
/// is the bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// The full texture (0,0) to (1,1).
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build from pixel coordinates and texture dimensions.
    pub fn from_pixels(x: f32, y: f32, w: f32, h: f32, tex_w: f32, tex_h: f32) -> Self {
        Self {
            min: Vec2::new(x / tex_w, y / tex_h),
            max: Vec2::new((x + w) / tex_w, (y + h) / tex_h),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL
    }
}
