//! Startup configuration.
//!
//! The configuration is an optional JSON file. Every field has a default, so a file only needs
//! to mention what it changes and a missing file means "all defaults".

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tetra_core::FrameSettings;

/// Where the configuration is looked up when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "tetraview.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Test Window".to_string(),
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("shaders/shader.vert"),
            fragment: PathBuf::from("shaders/shader.frag"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let frame = FrameSettings::default();
        Self {
            fov_y_degrees: frame.fov_y_degrees,
            near: frame.near,
            far: frame.far,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub shaders: ShaderPaths,
    pub clear_color: [f32; 4],
    pub projection: ProjectionConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shaders: ShaderPaths::default(),
            clear_color: FrameSettings::default().clear_color,
            projection: ProjectionConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads the configuration at `path`, falling back to the defaults if the file is absent.
    pub fn load(path: &Path) -> Result<Self, String> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                Self::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(format!("Failed to read {}: {e}", path.display())),
        }
    }

    /// Parses and checks a configuration document.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(format!(
                "Window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            ));
        }
        let p = &self.projection;
        if !(p.fov_y_degrees > 0.0 && p.fov_y_degrees < 180.0) {
            return Err(format!(
                "Field of view must be between 0 and 180 degrees, got {}",
                p.fov_y_degrees
            ));
        }
        if !(p.near > 0.0 && p.far > p.near) {
            return Err(format!(
                "Clip planes must satisfy 0 < near < far, got near={} far={}",
                p.near, p.far
            ));
        }
        self.log_level_filter()?;
        Ok(())
    }

    /// The configured log level.
    pub fn log_level_filter(&self) -> Result<log::LevelFilter, String> {
        self.log_level
            .parse()
            .map_err(|_| format!("Unknown log level `{}`", self.log_level))
    }

    /// Per-frame parameters for the render loop.
    pub fn frame_settings(&self) -> FrameSettings {
        FrameSettings {
            clear_color: self.clear_color,
            fov_y_degrees: self.projection.fov_y_degrees,
            near: self.projection.near,
            far: self.projection.far,
        }
    }
}
