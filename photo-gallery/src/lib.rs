//! # Photo Gallery
//!
//! Capture, persist and reload a small on-device photo gallery for hybrid apps.
//!
//! This crate provides the cross-platform gallery logic:
//! - Photo capture through a [`CaptureProvider`]
//! - Payload storage through a [`FileStore`]
//! - A JSON manifest of the gallery in a [`PreferencesStore`]
//! - Native and web display strategies, chosen once via a [`PlatformDetector`]
//!
//! ## Platform Separation
//!
//! In a native shell photos are addressed by their file URI, which the webview
//! loads through a rewritten local URL. In a browser photos are addressed by
//! filename and displayed as `data:` URLs read back from the file store.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use photo_gallery::{
//!     DeviceCamera, GalleryConfig, LocalFileStore, MemoryBlobSource, PhotoService,
//!     SqlitePreferences, TargetPlatform,
//! };
//!
//! let service = PhotoService::new(
//!     GalleryConfig::default(),
//!     DeviceCamera::default(),
//!     SqlitePreferences::open("/path/to/preferences.db")?,
//!     LocalFileStore::new("/path/to/files"),
//!     &TargetPlatform,
//!     MemoryBlobSource::new(),
//! );
//! service.load_saved().await?;
//! let photo = service.capture().await?;
//! ```

pub mod blob;
pub mod environment;
pub mod error;
pub mod filesystem;
pub mod models;
pub mod picker;
pub mod platform;
pub mod preferences;
pub mod schema;
pub mod service;

pub use blob::{read_as_data_url, Blob, BlobFetcher, FsBlobFetcher, MemoryBlobSource};
pub use environment::{Environment, NativeEnvironment, PlatformStrategy, WebEnvironment};
pub use error::GalleryError;
pub use filesystem::{
    FileStore, FileStoreError, LocalFileStore, MemoryFileStore, ReadFileOptions, ReadFileResult,
    WriteFileOptions, WriteFileResult,
};
pub use models::{CameraSource, CaptureOptions, Directory, GalleryConfig, PhotoRef, UserPhoto};
pub use picker::{CaptureProvider, DeviceCamera, DeviceCameraConfig, PickerError};
pub use platform::{convert_file_src, FixedPlatform, Platform, PlatformDetector, TargetPlatform};
pub use preferences::{MemoryPreferences, PreferencesError, PreferencesStore, SqlitePreferences};
pub use schema::init_preferences_schema;
pub use service::{parse_manifest, PhotoService};

#[cfg(feature = "http-fetch")]
pub use blob::HttpBlobFetcher;
#[cfg(feature = "file-picker")]
pub use picker::FilePicker;
