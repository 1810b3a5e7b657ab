use crate::config::AppConfig;
use crate::error::AppError;
use crate::filesystem;
use photo_gallery::{FsBlobFetcher, LocalFileStore, PhotoService, SqlitePreferences};
use std::sync::OnceLock;

// Desktop has no camera bridge; photos are picked from disk instead
#[cfg(feature = "desktop")]
pub type Camera = photo_gallery::FilePicker;
#[cfg(not(feature = "desktop"))]
pub type Camera = photo_gallery::DeviceCamera;

pub type GalleryService = PhotoService<Camera, SqlitePreferences, LocalFileStore, FsBlobFetcher>;

// Global app configuration and gallery service
static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
static GALLERY_SERVICE: OnceLock<GalleryService> = OnceLock::new();

/// Configuration from `photo-diary.toml`, falling back to defaults when unreadable
pub fn app_config() -> &'static AppConfig {
    APP_CONFIG.get_or_init(|| {
        let path = filesystem::get_config_path();
        AppConfig::load(&path).unwrap_or_else(|e| {
            log::warn!("Using default configuration, {:?} unusable: {}", path, e);
            AppConfig::default()
        })
    })
}

/// Initialize the gallery service
pub fn init_gallery_service() -> Result<&'static GalleryService, AppError> {
    if let Some(service) = GALLERY_SERVICE.get() {
        return Ok(service);
    }

    let config = app_config();
    let preferences = SqlitePreferences::open(filesystem::get_preferences_path())?;
    let files = LocalFileStore::new(filesystem::get_photos_dir());
    log::info!(
        "Gallery storage at {:?} ({:?} platform)",
        filesystem::get_app_data_dir(),
        config.platform()
    );

    let service = PhotoService::new(
        config.gallery.clone(),
        Camera::default(),
        preferences,
        files,
        &config.platform,
        FsBlobFetcher,
    );
    Ok(GALLERY_SERVICE.get_or_init(|| service))
}
