use crate::error::AppError;
use photo_gallery::{GalleryConfig, Platform, PlatformDetector, TargetPlatform};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which platform strategy the gallery uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformChoice {
    /// Decide from the build target
    #[default]
    Auto,
    Native,
    Web,
}

impl PlatformDetector for PlatformChoice {
    fn is_native_shell(&self) -> bool {
        match self {
            PlatformChoice::Auto => TargetPlatform.is_native_shell(),
            PlatformChoice::Native => true,
            PlatformChoice::Web => false,
        }
    }
}

/// App configuration, read from `photo-diary.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub platform: PlatformChoice,
    /// `log` filter, e.g. "info" or "photo_gallery=debug"
    pub log_level: String,
    pub gallery: GalleryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            platform: PlatformChoice::Auto,
            log_level: "info".to_string(),
            gallery: GalleryConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(raw)?)
    }

    /// Loads the config file; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self, AppError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AppError::Filesystem(e)),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform.platform()
    }
}
