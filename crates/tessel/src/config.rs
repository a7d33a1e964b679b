//! Engine configuration.
//!
//! Everything has a default, so an empty JSON object (or no file at all) is
//! a valid configuration:
//!
//! ```json
//! {
//!   "log_filter": "tessel=debug",
//!   "camera": { "position": [0.0, 0.0], "zoom": 2.0 },
//!   "atlas": { "width": 256, "height": 256, "tile_size": 16 },
//!   "player_move_speed": 100.0
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::Camera2d;
use crate::error::{Error, Result};
use crate::render2d::atlas::AtlasGrid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default `env_logger` filter. `RUST_LOG` overrides it.
    pub log_filter: String,
    pub camera: Camera2d,
    pub atlas: AtlasGrid,
    /// Speed given to player-controlled entities, in world units per second.
    pub player_move_speed: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            camera: Camera2d::default().with_zoom(2.0),
            atlas: AtlasGrid::default(),
            player_move_speed: 100.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;
        self.atlas.validate()?;
        if !(self.player_move_speed.is_finite() && self.player_move_speed >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "player_move_speed must be finite and non-negative, got {}",
                self.player_move_speed
            )));
        }
        Ok(())
    }

    /// Install `env_logger` with this config's filter as the default. Safe to
    /// call more than once; later calls are ignored.
    pub fn init_logging(&self) {
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_filter.as_str()),
        )
        .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    #[test]
    fn empty_object_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.camera.zoom, 2.0);
    }

    #[test]
    fn partial_override() {
        let config = EngineConfig::from_json_str(
            r#"{ "camera": { "position": [4.0, 8.0] }, "player_move_speed": 60.0 }"#,
        )
        .unwrap();
        assert_eq!(config.camera.position, Vec2::new(4.0, 8.0));
        assert_eq!(config.camera.zoom, 1.0);
        assert_eq!(config.player_move_speed, 60.0);
        assert_eq!(config.atlas, AtlasGrid::default());
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ nope"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "camera": { "zoom": -1.0 } }"#),
            Err(Error::InvalidCameraState { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "atlas": { "width": 0, "height": 0, "tile_size": 0 } }"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "player_move_speed": -5.0 }"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            EngineConfig::load("/definitely/not/here.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn init_logging_twice_is_harmless() {
        let config = EngineConfig::default();
        config.init_logging();
        config.init_logging();
    }
}
