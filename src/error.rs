use photo_gallery::{GalleryError, PreferencesError};
use std::fmt;

/// Central error types for the Photo Diary app
#[derive(Debug)]
pub enum AppError {
    /// Capture or gallery storage error
    Gallery(GalleryError),
    /// Preferences database could not be opened
    Storage(PreferencesError),
    /// Configuration file unreadable or invalid
    Config(String),
    /// Filesystem error
    Filesystem(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Gallery(e) => write!(f, "Gallery error: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

// Conversions from other error types
impl From<GalleryError> for AppError {
    fn from(e: GalleryError) -> Self {
        AppError::Gallery(e)
    }
}

impl From<PreferencesError> for AppError {
    fn from(e: PreferencesError) -> Self {
        AppError::Storage(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

/// User-friendly error messages for UI
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Gallery(GalleryError::CaptureCancelled(_)) => {
                "No photo was taken.".to_string()
            }
            AppError::Gallery(GalleryError::PermissionDenied(_)) => {
                "Camera permission is required to take photos.".to_string()
            }
            AppError::Gallery(GalleryError::CaptureUnavailable(_)) => {
                "No camera is available on this device.".to_string()
            }
            AppError::Gallery(GalleryError::StorageWriteFailed(_)) => {
                "The photo could not be saved. Is the storage full?".to_string()
            }
            AppError::Gallery(_) | AppError::Storage(_) | AppError::Filesystem(_) => {
                "Error accessing the gallery storage. Please check app permissions.".to_string()
            }
            AppError::Config(msg) => format!("Invalid configuration: {}", msg),
        }
    }
}
