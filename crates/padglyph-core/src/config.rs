//! Configuration loading and saving

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::controls::DeviceKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database files, loaded cumulatively in order
    #[serde(default = "default_files")]
    pub files: Vec<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            files: default_files(),
        }
    }
}

fn default_files() -> Vec<PathBuf> {
    vec![PathBuf::from("controllerimage-standard.bin")]
}

/// Device types used when nothing more specific matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_gamepad")]
    pub gamepad: String,
    #[serde(default = "default_keyboard")]
    pub keyboard: String,
    #[serde(default = "default_mouse")]
    pub mouse: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            gamepad: default_gamepad(),
            keyboard: default_keyboard(),
            mouse: default_mouse(),
        }
    }
}

impl FallbackConfig {
    pub fn for_kind(&self, kind: DeviceKind) -> &str {
        match kind {
            DeviceKind::Gamepad => &self.gamepad,
            DeviceKind::Keyboard => &self.keyboard,
            DeviceKind::Mouse => &self.mouse,
        }
    }
}

fn default_gamepad() -> String {
    "xbox360".to_string()
}

fn default_keyboard() -> String {
    "keyboard".to_string()
}

fn default_mouse() -> String {
    "mouse".to_string()
}

/// Hints handed to the vector parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_dpi")]
    pub dpi: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            units: default_units(),
            dpi: default_dpi(),
        }
    }
}

fn default_units() -> String {
    "px".to_string()
}

fn default_dpi() -> f32 {
    96.0
}

impl ArtConfig {
    /// Load from `path`, falling back to defaults if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml(&content)?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        } else {
            info!(
                path = %path.display(),
                "Configuration file not found, using defaults"
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}
