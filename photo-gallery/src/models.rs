use serde::{Deserialize, Serialize};

/// A captured photo as listed in the gallery.
///
/// Only `filepath` is written to the manifest. `webview_path` depends on the
/// platform the gallery was loaded on and is rebuilt on every load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPhoto {
    /// Key to read the payload back from the file store.
    /// Native: canonical file URI. Web: generated filename.
    pub filepath: String,
    /// Source an `<img>` element can render directly
    #[serde(skip_serializing, default)]
    pub webview_path: Option<String>,
}

impl UserPhoto {
    pub fn new(filepath: impl Into<String>, webview_path: Option<String>) -> Self {
        Self {
            filepath: filepath.into(),
            webview_path,
        }
    }
}

/// Reference to a freshly captured image, as handed out by a capture provider
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhotoRef {
    /// Local filesystem path (native shells)
    pub path: Option<String>,
    /// Browser-accessible reference, e.g. a `blob:` URL
    pub web_path: Option<String>,
    /// Image format reported by the provider ("jpeg", "png", ...)
    pub format: String,
}

/// Where the capture provider takes the image from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraSource {
    #[default]
    Camera,
    Photos,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// JPEG quality 0..=100
    pub quality: u8,
    pub source: CameraSource,
}

/// Storage area of the file store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Directory {
    /// Private app data, survives restarts
    #[default]
    Data,
    Documents,
    Cache,
}

impl Directory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Directory::Data => "data",
            Directory::Documents => "documents",
            Directory::Cache => "cache",
        }
    }
}

/// Configuration for the gallery service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Preferences key the manifest is stored under
    pub manifest_key: String,
    /// File store directory photo payloads are written to
    pub directory: Directory,
    /// Capture quality requested from the camera
    pub quality: u8,
    pub source: CameraSource,
    /// Extension of generated filenames
    pub file_extension: String,
    /// Base URL native file URIs are rewritten to for display in the webview
    pub local_file_url: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            manifest_key: "photos".to_string(),
            directory: Directory::Data,
            quality: 100,
            source: CameraSource::Camera,
            file_extension: "jpeg".to_string(),
            local_file_url: "http://localhost/_app_file_".to_string(),
        }
    }
}

impl GalleryConfig {
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            quality: self.quality.min(100),
            source: self.source,
        }
    }
}
