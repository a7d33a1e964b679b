//! # Camera: World Space to View Space
//!
//! A [`Camera2d`] is a focus point in world space plus a zoom factor. It is
//! not an entity; by convention one camera per viewport is stored as a world
//! resource and read by the renderer every frame.
//!
//! ```text
//! view = Scale(zoom, zoom, 1) · Translate(-x, -y, 0)
//!
//! world (10, 5) ──translate──▶ (0, 0) ──scale──▶ (0, 0)      the focus
//! world (11, 5) ──translate──▶ (1, 0) ──scale──▶ (2, 0)      zoom = 2
//! ```
//!
//! Translation is applied first, so the focus always lands on the origin and
//! zoom magnifies around it. Larger zoom means things look bigger.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{Mat4, Vec2, Vec3};

/// 2D camera: world-space focus and zoom (`> 0`, larger = more magnified).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera2d {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2d {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera2d {
    pub fn new(position: Vec2, zoom: f32) -> Self {
        Self { position, zoom }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Fails with [`Error::InvalidCameraState`] unless zoom is positive and
    /// finite.
    pub fn validate(&self) -> Result<()> {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidCameraState { zoom: self.zoom })
        }
    }

    /// The view matrix for this camera. See [`view_transform`].
    pub fn view_transform(&self) -> Result<Mat4> {
        view_transform(self)
    }
}

/// Map world space to view space: translate by the negated focus, then scale
/// by zoom on x and y.
pub fn view_transform(camera: &Camera2d) -> Result<Mat4> {
    camera.validate()?;
    let scale = Mat4::from_scale(Vec3::new(camera.zoom, camera.zoom, 1.0));
    let translate = Mat4::from_translation(Vec3::new(-camera.position.x, -camera.position.y, 0.0));
    Ok(scale * translate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: Mat4, x: f32, y: f32) -> Vec2 {
        m.transform_point3(Vec3::new(x, y, 0.0)).truncate()
    }

    #[test]
    fn focus_maps_to_origin() {
        let cam = Camera2d::new(Vec2::new(10.0, 5.0), 2.0);
        let view = view_transform(&cam).unwrap();
        assert_eq!(apply(view, 10.0, 5.0), Vec2::ZERO);
    }

    #[test]
    fn zoom_two_doubles_apparent_size() {
        let at = Vec2::new(10.0, 5.0);
        let v1 = view_transform(&Camera2d::new(at, 1.0)).unwrap();
        let v2 = view_transform(&Camera2d::new(at, 2.0)).unwrap();
        let len1 = (apply(v1, 13.0, 5.0) - apply(v1, 10.0, 5.0)).length();
        let len2 = (apply(v2, 13.0, 5.0) - apply(v2, 10.0, 5.0)).length();
        assert_eq!(len1, 3.0);
        assert_eq!(len2, 6.0);
    }

    #[test]
    fn z_is_untouched() {
        let view = Camera2d::new(Vec2::new(1.0, 1.0), 4.0).view_transform().unwrap();
        let p = view.transform_point3(Vec3::new(1.0, 1.0, 0.5));
        assert_eq!(p.z, 0.5);
    }

    #[test]
    fn rejects_bad_zoom() {
        for zoom in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let cam = Camera2d::default().with_zoom(zoom);
            assert!(matches!(
                view_transform(&cam),
                Err(Error::InvalidCameraState { .. })
            ));
        }
    }

    #[test]
    fn deserializes_with_defaults() {
        let cam: Camera2d = serde_json::from_str(r#"{ "zoom": 3.0 }"#).unwrap();
        assert_eq!(cam.position, Vec2::ZERO);
        assert_eq!(cam.zoom, 3.0);
    }
}
