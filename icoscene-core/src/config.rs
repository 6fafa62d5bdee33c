//! Scene configuration, loadable from JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::material::Color;

/// Everything needed to build the default scene and drive it.
///
/// Missing fields in a JSON file fall back to [`SceneConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Supersample each cell 2x2 when rasterizing
    pub antialias: bool,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial camera distance along +Z
    pub camera_distance: f32,
    pub radius: f32,
    pub detail: u32,
    pub mesh_color: Color,
    pub flat_shading: bool,
    pub wire_color: Color,
    pub sky_color: Color,
    pub ground_color: Color,
    pub light_intensity: f32,
    /// Radians of Y rotation per millisecond of elapsed time
    pub rotation_speed: f64,
    pub enable_damping: bool,
    pub damping_factor: f32,
    /// Target frames per second for paced front-ends
    pub fps: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            fov_degrees: 75.0,
            near: 0.1,
            far: 10.0,
            camera_distance: 2.0,
            radius: 1.0,
            detail: 2,
            mesh_color: Color::WHITE,
            flat_shading: true,
            wire_color: Color::WHITE,
            sky_color: Color::from_hex(0x0099ff),
            ground_color: Color::from_hex(0xaa5500),
            light_intensity: 1.0,
            rotation_speed: 0.0001,
            enable_damping: true,
            damping_factor: 0.03,
            fps: 30,
        }
    }
}

impl SceneConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(Error::Config(format!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(Error::Config(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        if !(self.camera_distance > 0.0) {
            return Err(Error::Config("camera_distance must be positive".into()));
        }
        if !(self.damping_factor > 0.0 && self.damping_factor <= 1.0) {
            return Err(Error::Config(format!(
                "damping_factor must be in (0, 1], got {}",
                self.damping_factor
            )));
        }
        if !self.rotation_speed.is_finite() {
            return Err(Error::Config("rotation_speed must be finite".into()));
        }
        if self.fps == 0 {
            return Err(Error::Config("fps must be at least 1".into()));
        }
        Ok(())
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }
}
