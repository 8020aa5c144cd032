//! Viewer configuration
//!
//! Stored as RON. Missing fields take their defaults; a missing file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::info;
use crate::rasterizer::RenderSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub render: RenderSettings,
    /// World units per frame for dolly, strafe and vertical moves
    pub move_speed: f32,
    /// Radians per frame for turning the view
    pub turn_speed: f32,
    /// Degrees per frame for orbiting the camera position
    pub orbit_speed: f32,
    /// Window pixels per rendered pixel
    pub display_scale: f32,
    /// Scene to open at startup; the built-in scene is used when absent
    pub scene: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            render: RenderSettings::default(),
            move_speed: 0.1,
            turn_speed: 0.03,
            orbit_speed: 2.0,
            display_scale: 1.0,
            scene: None,
        }
    }
}

impl ViewerConfig {
    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::from_ron(&fs::read_to_string(path)?)
    }

    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "render size must be non-zero, got {}x{}",
                self.render.width, self.render.height
            )));
        }
        if !(self.display_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "display_scale must be positive, got {}",
                self.display_scale
            )));
        }
        Ok(())
    }
}
