use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Viewport configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Orbit camera limits, sensitivities and projection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Yaw at reset, radians.
    pub initial_yaw: f32,
    /// Pitch at reset, radians.
    pub initial_pitch: f32,
    pub initial_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Pitch is clamped to +/- this many degrees.
    pub pitch_limit_deg: f32,
    /// Radians of yaw/pitch per unit of drag.
    pub orbit_sensitivity: f32,
    /// Fractional distance change per zoom step.
    pub zoom_step: f32,
    /// Pan distance per unit of drag, scaled by camera distance.
    pub pan_sensitivity: f32,
    /// Vertical field of view, degrees.
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_yaw: -0.8,
            initial_pitch: 0.6,
            initial_distance: 20.0,
            min_distance: 4.0,
            max_distance: 100.0,
            pitch_limit_deg: 85.0,
            orbit_sensitivity: 0.01,
            zoom_step: 0.1,
            pan_sensitivity: 0.002,
            fov_y_deg: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Lighting and clear colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Direction the light travels; normalized on use.
    pub light_dir: Vec3,
    /// Minimum intensity applied to every face, `[0, 1]`.
    pub ambient: f32,
    /// Opaque ARGB clear colour.
    pub background: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            light_dir: Vec3::new(0.5, -1.0, 0.3),
            ambient: 0.25,
            background: 0xFF00_0000,
        }
    }
}

/// Everything the 3D viewport needs, as loaded from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub camera: CameraConfig,
    pub render: RenderConfig,
}

impl ViewportConfig {
    /// Parse JSON; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "viewport config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if !(cam.min_distance > 0.0 && cam.min_distance <= cam.max_distance) {
            return Err(ConfigError::Invalid("distance limits must satisfy 0 < min <= max"));
        }
        if !(cam.pitch_limit_deg > 0.0 && cam.pitch_limit_deg < 90.0) {
            return Err(ConfigError::Invalid("pitch limit must be between 0 and 90 degrees"));
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(ConfigError::Invalid("clip planes must satisfy 0 < near < far"));
        }
        if !(cam.fov_y_deg > 0.0 && cam.fov_y_deg < 180.0) {
            return Err(ConfigError::Invalid("fov must be between 0 and 180 degrees"));
        }
        if !(0.0..=1.0).contains(&self.render.ambient) {
            return Err(ConfigError::Invalid("ambient must lie in [0, 1]"));
        }
        if self.render.light_dir.length_squared() == 0.0 {
            return Err(ConfigError::Invalid("light direction must be non-zero"));
        }
        Ok(())
    }
}
