//! # Vertex: Per-Corner Data for Baked Tile Geometry
//!
//! A tile layer is baked into one vertex buffer: two triangles (six
//! vertices) per non-empty tile. Each vertex carries a position in the
//! layer's local space and a texture coordinate into the atlas.
//!
//! ## Memory Layout
//!
//! The GPU reads vertex data as raw bytes at fixed offsets. `#[repr(C)]`
//! guarantees a predictable layout, and the `bytemuck` traits `Pod` and
//! `Zeroable` let us cast `&[TileVertex]` to `&[u8]` for upload without a
//! copy.
//!
//! ```text
//! TileVertex (16 bytes per vertex)
//! ┌──────────────┬──────────────┐
//! │ position     │ uv           │
//! │ [f32; 2]     │ [f32; 2]     │
//! │ 8 bytes      │ 8 bytes      │
//! │ offset 0     │ offset 8     │
//! │ location(0)  │ location(1)  │
//! └──────────────┴──────────────┘
//! ```
//!
//! ## Quad Winding
//!
//! ```text
//!  TL(x, y) ───────── TR(x+w, y)
//!     │ ╲                │
//!     │    ╲     2       │        triangle 1: TL, BL, BR
//!     │  1    ╲          │        triangle 2: BR, TR, TL
//!     │          ╲       │
//!  BL(x, y+h) ─────── BR(x+w, y+h)
//! ```
//!
//! Y grows downward, so row 0 is at the top of the layer.

use bytemuck::{Pod, Zeroable};

use crate::math::{Rect, Vec2};

/// One corner of a baked tile quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TileVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl TileVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<TileVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: Vec2, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Append the six vertices of one quad: `origin` is the top-left corner.
pub(crate) fn push_quad(out: &mut Vec<TileVertex>, origin: Vec2, size: Vec2, uv: Rect) {
    let (x, y) = (origin.x, origin.y);
    let (w, h) = (size.x, size.y);
    let tl = TileVertex::new(Vec2::new(x, y), Vec2::new(uv.min.x, uv.min.y));
    let bl = TileVertex::new(Vec2::new(x, y + h), Vec2::new(uv.min.x, uv.max.y));
    let br = TileVertex::new(Vec2::new(x + w, y + h), Vec2::new(uv.max.x, uv.max.y));
    let tr = TileVertex::new(Vec2::new(x + w, y), Vec2::new(uv.max.x, uv.min.y));
    out.extend_from_slice(&[tl, bl, br, br, tr, tl]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_struct() {
        assert_eq!(std::mem::size_of::<TileVertex>(), 16);
        assert_eq!(TileVertex::LAYOUT.array_stride, 16);
        assert_eq!(TileVertex::LAYOUT.attributes[1].offset, 8);
    }

    #[test]
    fn quad_order_and_uvs() {
        let mut out = Vec::new();
        let uv = Rect::new(Vec2::new(0.25, 0.5), Vec2::new(0.5, 0.75));
        push_quad(&mut out, Vec2::new(16.0, 0.0), Vec2::new(16.0, 8.0), uv);
        assert_eq!(out.len(), 6);
        let pos: Vec<[f32; 2]> = out.iter().map(|v| v.position).collect();
        assert_eq!(
            pos,
            vec![
                [16.0, 0.0],
                [16.0, 8.0],
                [32.0, 8.0],
                [32.0, 8.0],
                [32.0, 0.0],
                [16.0, 0.0],
            ]
        );
        assert_eq!(out[0].uv, [0.25, 0.5]);
        assert_eq!(out[1].uv, [0.25, 0.75]);
        assert_eq!(out[2].uv, [0.5, 0.75]);
        assert_eq!(out[4].uv, [0.5, 0.5]);
    }

    #[test]
    fn casts_to_bytes() {
        let v = [TileVertex::new(Vec2::ONE, Vec2::ZERO)];
        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(bytes.len(), 16);
    }
}
