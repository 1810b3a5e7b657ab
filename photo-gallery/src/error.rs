use crate::filesystem::FileStoreError;
use crate::picker::PickerError;
use crate::preferences::PreferencesError;

/// Error type for gallery operations
#[derive(Debug)]
pub enum GalleryError {
    /// User dismissed the capture UI, or it timed out
    CaptureCancelled(String),
    /// Camera permission denied
    PermissionDenied(String),
    /// No capture provider on this platform
    CaptureUnavailable(String),
    StorageWriteFailed(FileStoreError),
    StorageReadFailed(FileStoreError),
    /// Key-value storage is unavailable
    PreferencesUnavailable(PreferencesError),
    /// Manifest could not be parsed
    ManifestCorrupt(serde_json::Error),
    Serialization(serde_json::Error),
}

impl std::fmt::Display for GalleryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GalleryError::CaptureCancelled(msg) => write!(f, "Capture cancelled: {}", msg),
            GalleryError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            GalleryError::CaptureUnavailable(msg) => write!(f, "Capture unavailable: {}", msg),
            GalleryError::StorageWriteFailed(e) => write!(f, "Storage write failed: {}", e),
            GalleryError::StorageReadFailed(e) => write!(f, "Storage read failed: {}", e),
            GalleryError::PreferencesUnavailable(e) => write!(f, "Preferences unavailable: {}", e),
            GalleryError::ManifestCorrupt(e) => write!(f, "Manifest corrupt: {}", e),
            GalleryError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for GalleryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GalleryError::StorageWriteFailed(e) | GalleryError::StorageReadFailed(e) => Some(e),
            GalleryError::PreferencesUnavailable(e) => Some(e),
            GalleryError::ManifestCorrupt(e) | GalleryError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PickerError> for GalleryError {
    fn from(err: PickerError) -> Self {
        match err {
            PickerError::Cancelled(msg) | PickerError::Timeout(msg) => {
                GalleryError::CaptureCancelled(msg)
            }
            PickerError::PermissionDenied(msg) => GalleryError::PermissionDenied(msg),
            PickerError::PlatformNotSupported(msg) | PickerError::Other(msg) => {
                GalleryError::CaptureUnavailable(msg)
            }
        }
    }
}

impl From<PreferencesError> for GalleryError {
    fn from(err: PreferencesError) -> Self {
        GalleryError::PreferencesUnavailable(err)
    }
}

impl GalleryError {
    /// Whether the failure came from the user or the device rather than storage
    pub fn is_capture_failure(&self) -> bool {
        matches!(
            self,
            GalleryError::CaptureCancelled(_)
                | GalleryError::PermissionDenied(_)
                | GalleryError::CaptureUnavailable(_)
        )
    }
}
