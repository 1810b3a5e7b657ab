//! Native and web strategies for saving and displaying photos.
//!
//! The gallery service picks one [`Environment`] at construction time and
//! never looks at the platform again.

use crate::blob::{data_url_payload, jpeg_data_url, read_as_data_url, BlobFetcher};
use crate::error::GalleryError;
use crate::filesystem::{FileStore, FileStoreError, ReadFileOptions, WriteFileResult};
use crate::models::{Directory, GalleryConfig, PhotoRef, UserPhoto};
use crate::platform::{convert_file_src, Platform, PlatformDetector};

/// What differs between a native shell and a browser
#[allow(async_fn_in_trait)]
pub trait PlatformStrategy {
    fn platform(&self) -> Platform;

    /// Base64 payload of a freshly captured photo
    async fn read_as_base64<F: FileStore>(
        &self,
        files: &F,
        captured: &PhotoRef,
    ) -> Result<String, GalleryError>;

    /// Record for a photo that was just written under `file_name`
    fn saved_photo(&self, file_name: &str, saved: WriteFileResult, captured: &PhotoRef)
        -> UserPhoto;

    /// Fills in `webview_path` for photos loaded from the manifest
    async fn resolve_display_sources<F: FileStore>(&self, files: &F, photos: &mut [UserPhoto]);
}

/// Native shell: photos are addressed by file URI, displayed through the
/// webview's local file URL.
#[derive(Debug, Clone)]
pub struct NativeEnvironment {
    local_file_url: String,
}

impl NativeEnvironment {
    pub fn new(local_file_url: impl Into<String>) -> Self {
        Self {
            local_file_url: local_file_url.into(),
        }
    }
}

impl PlatformStrategy for NativeEnvironment {
    fn platform(&self) -> Platform {
        Platform::Native
    }

    async fn read_as_base64<F: FileStore>(
        &self,
        files: &F,
        captured: &PhotoRef,
    ) -> Result<String, GalleryError> {
        let path = captured.path.as_ref().ok_or_else(|| {
            GalleryError::StorageReadFailed(FileStoreError::ReadFailed(
                "Captured photo has no local path".to_string(),
            ))
        })?;

        let file = files
            .read_file(ReadFileOptions {
                path: path.clone(),
                directory: None,
            })
            .await
            .map_err(GalleryError::StorageReadFailed)?;
        Ok(file.data)
    }

    fn saved_photo(
        &self,
        _file_name: &str,
        saved: WriteFileResult,
        _captured: &PhotoRef,
    ) -> UserPhoto {
        let webview_path = convert_file_src(&saved.uri, &self.local_file_url);
        UserPhoto::new(saved.uri, Some(webview_path))
    }

    async fn resolve_display_sources<F: FileStore>(&self, _files: &F, photos: &mut [UserPhoto]) {
        // The stored URI is directly loadable, no file reads needed
        for photo in photos.iter_mut() {
            photo.webview_path = Some(convert_file_src(&photo.filepath, &self.local_file_url));
        }
    }
}

/// Browser: photos are addressed by filename and displayed as data URLs.
#[derive(Debug, Clone)]
pub struct WebEnvironment<B> {
    fetcher: B,
    directory: Directory,
}

impl<B: BlobFetcher> WebEnvironment<B> {
    pub fn new(fetcher: B, directory: Directory) -> Self {
        Self { fetcher, directory }
    }
}

impl<B: BlobFetcher> PlatformStrategy for WebEnvironment<B> {
    fn platform(&self) -> Platform {
        Platform::Web
    }

    async fn read_as_base64<F: FileStore>(
        &self,
        _files: &F,
        captured: &PhotoRef,
    ) -> Result<String, GalleryError> {
        let web_path = captured.web_path.as_ref().ok_or_else(|| {
            GalleryError::StorageReadFailed(FileStoreError::ReadFailed(
                "Captured photo has no web path".to_string(),
            ))
        })?;

        let blob = self
            .fetcher
            .fetch(web_path)
            .await
            .map_err(GalleryError::StorageReadFailed)?;
        let data_url = read_as_data_url(blob)
            .await
            .map_err(GalleryError::StorageReadFailed)?;
        let payload = data_url_payload(&data_url).map_err(GalleryError::StorageReadFailed)?;
        Ok(payload.to_string())
    }

    fn saved_photo(&self, file_name: &str, _saved: WriteFileResult, captured: &PhotoRef) -> UserPhoto {
        UserPhoto::new(file_name, captured.web_path.clone())
    }

    async fn resolve_display_sources<F: FileStore>(&self, files: &F, photos: &mut [UserPhoto]) {
        for photo in photos.iter_mut() {
            let read = files
                .read_file(ReadFileOptions {
                    path: photo.filepath.clone(),
                    directory: Some(self.directory),
                })
                .await;

            photo.webview_path = match read {
                Ok(file) => Some(jpeg_data_url(&file.data)),
                Err(e) => {
                    log::warn!("Failed to read photo {}: {}", photo.filepath, e);
                    None
                }
            };
        }
    }
}

/// The strategy chosen for the current platform
#[derive(Debug, Clone)]
pub enum Environment<B> {
    Native(NativeEnvironment),
    Web(WebEnvironment<B>),
}

impl<B: BlobFetcher> Environment<B> {
    pub fn detect(detector: &impl PlatformDetector, config: &GalleryConfig, fetcher: B) -> Self {
        match detector.platform() {
            Platform::Native => {
                Environment::Native(NativeEnvironment::new(config.local_file_url.clone()))
            }
            Platform::Web => Environment::Web(WebEnvironment::new(fetcher, config.directory)),
        }
    }
}

impl<B: BlobFetcher> PlatformStrategy for Environment<B> {
    fn platform(&self) -> Platform {
        match self {
            Environment::Native(env) => env.platform(),
            Environment::Web(env) => env.platform(),
        }
    }

    async fn read_as_base64<F: FileStore>(
        &self,
        files: &F,
        captured: &PhotoRef,
    ) -> Result<String, GalleryError> {
        match self {
            Environment::Native(env) => env.read_as_base64(files, captured).await,
            Environment::Web(env) => env.read_as_base64(files, captured).await,
        }
    }

    fn saved_photo(&self, file_name: &str, saved: WriteFileResult, captured: &PhotoRef) -> UserPhoto {
        match self {
            Environment::Native(env) => env.saved_photo(file_name, saved, captured),
            Environment::Web(env) => env.saved_photo(file_name, saved, captured),
        }
    }

    async fn resolve_display_sources<F: FileStore>(&self, files: &F, photos: &mut [UserPhoto]) {
        match self {
            Environment::Native(env) => env.resolve_display_sources(files, photos).await,
            Environment::Web(env) => env.resolve_display_sources(files, photos).await,
        }
    }
}
