use crate::blob::BlobFetcher;
use crate::environment::{Environment, PlatformStrategy};
use crate::error::GalleryError;
use crate::filesystem::{FileStore, WriteFileOptions};
use crate::models::{GalleryConfig, UserPhoto};
use crate::picker::CaptureProvider;
use crate::platform::{Platform, PlatformDetector};
use crate::preferences::PreferencesStore;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{watch, Mutex};

/// Parses a stored manifest. `null` counts as an empty gallery.
pub fn parse_manifest(raw: &str) -> Result<Vec<UserPhoto>, GalleryError> {
    let photos: Option<Vec<UserPhoto>> =
        serde_json::from_str(raw).map_err(GalleryError::ManifestCorrupt)?;
    let mut seen = HashSet::new();
    Ok(photos
        .unwrap_or_default()
        .into_iter()
        .filter(|photo| seen.insert(photo.filepath.clone()))
        .collect())
}

/// Photo Gallery Service
///
/// Owns the gallery list (newest first) and keeps it in sync with the
/// manifest in the preferences store. Captures and loads are serialized, so
/// concurrent calls from the UI cannot drop each other's photos.
pub struct PhotoService<C, P, F, B> {
    config: GalleryConfig,
    camera: C,
    preferences: P,
    files: F,
    environment: Environment<B>,
    photos: watch::Sender<Vec<UserPhoto>>,
    operation: Mutex<()>,
    last_timestamp: AtomicI64,
}

impl<C, P, F, B> PhotoService<C, P, F, B>
where
    C: CaptureProvider,
    P: PreferencesStore,
    F: FileStore,
    B: BlobFetcher,
{
    pub fn new(
        config: GalleryConfig,
        camera: C,
        preferences: P,
        files: F,
        detector: &impl PlatformDetector,
        fetcher: B,
    ) -> Self {
        let environment = Environment::detect(detector, &config, fetcher);
        log::debug!("Photo service running on {:?}", environment.platform());
        let (photos, _) = watch::channel(Vec::new());
        Self {
            config,
            camera,
            preferences,
            files,
            environment,
            photos,
            operation: Mutex::new(()),
            last_timestamp: AtomicI64::new(0),
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn platform(&self) -> Platform {
        self.environment.platform()
    }

    /// Snapshot of the current gallery
    pub fn photos(&self) -> Vec<UserPhoto> {
        self.photos.borrow().clone()
    }

    /// Receiver that is notified whenever the gallery changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<UserPhoto>> {
        self.photos.subscribe()
    }

    /// Takes a photo, stores it and puts it at the front of the gallery.
    ///
    /// Nothing changes when capture, file write or manifest write fail.
    pub async fn capture(&self) -> Result<UserPhoto, GalleryError> {
        let captured = self
            .camera
            .request_photo(self.config.capture_options())
            .await?;
        log::debug!("Captured photo: {:?}", captured);

        let data = self
            .environment
            .read_as_base64(&self.files, &captured)
            .await?;

        let _guard = self.operation.lock().await;
        let mut photos = self.photos();
        let file_name = self.next_file_name(&photos);

        let saved = self
            .files
            .write_file(WriteFileOptions {
                path: file_name.clone(),
                data,
                directory: self.config.directory,
            })
            .await
            .map_err(GalleryError::StorageWriteFailed)?;
        log::debug!("Photo written: {}", saved.uri);

        let photo = self.environment.saved_photo(&file_name, saved, &captured);
        photos.insert(0, photo.clone());

        if let Err(e) = self.persist(&photos).await {
            log::warn!(
                "Manifest not updated, {} stays on disk unreferenced: {}",
                photo.filepath,
                e
            );
            return Err(e);
        }

        self.photos.send_replace(photos);
        Ok(photo)
    }

    /// Replaces the gallery with the stored manifest.
    ///
    /// A corrupt manifest loads as an empty gallery. On web, photos whose
    /// file cannot be read stay in the list without a display source.
    pub async fn load_saved(&self) -> Result<Vec<UserPhoto>, GalleryError> {
        let _guard = self.operation.lock().await;

        let raw = self.preferences.get(&self.config.manifest_key).await?;
        let mut photos = match raw {
            None => Vec::new(),
            Some(raw) => parse_manifest(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring stored gallery: {}", e);
                Vec::new()
            }),
        };

        self.environment
            .resolve_display_sources(&self.files, &mut photos)
            .await;
        log::debug!("Loaded {} photos", photos.len());

        self.photos.send_replace(photos.clone());
        Ok(photos)
    }

    async fn persist(&self, photos: &[UserPhoto]) -> Result<(), GalleryError> {
        let manifest = serde_json::to_string(photos).map_err(GalleryError::Serialization)?;
        self.preferences
            .set(&self.config.manifest_key, &manifest)
            .await?;
        Ok(())
    }

    /// `<millis>.<ext>`, strictly increasing and not used by any listed photo
    fn next_file_name(&self, photos: &[UserPhoto]) -> String {
        loop {
            let now = chrono::Utc::now().timestamp_millis();
            let previous = self
                .last_timestamp
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                    Some(now.max(last + 1))
                })
                .unwrap_or(now);
            let timestamp = now.max(previous + 1);
            let file_name = format!("{}.{}", timestamp, self.config.file_extension);

            let taken = photos.iter().any(|p| {
                p.filepath == file_name || p.filepath.ends_with(&format!("/{}", file_name))
            });
            if !taken {
                return file_name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{Blob, MemoryBlobSource};
    use crate::filesystem::MemoryFileStore;
    use crate::models::{CaptureOptions, Directory, PhotoRef};
    use crate::picker::PickerError;
    use crate::platform::FixedPlatform;
    use crate::preferences::{MemoryPreferences, SqlitePreferences};
    use base64::{engine::general_purpose, Engine as _};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Camera that replays a fixed list of results
    #[derive(Default)]
    struct ScriptedCamera {
        results: StdMutex<VecDeque<Result<PhotoRef, PickerError>>>,
    }

    impl ScriptedCamera {
        fn with(results: Vec<Result<PhotoRef, PickerError>>) -> Self {
            Self {
                results: StdMutex::new(results.into()),
            }
        }
    }

    impl CaptureProvider for ScriptedCamera {
        async fn request_photo(&self, _options: CaptureOptions) -> Result<PhotoRef, PickerError> {
            // Give other tasks a turn, like a real camera UI would
            tokio::task::yield_now().await;
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PickerError::Cancelled("no more photos".to_string())))
        }
    }

    fn web_ref(url: &str) -> Result<PhotoRef, PickerError> {
        Ok(PhotoRef {
            path: None,
            web_path: Some(url.to_string()),
            format: "jpeg".to_string(),
        })
    }

    fn native_ref(path: &str) -> Result<PhotoRef, PickerError> {
        Ok(PhotoRef {
            path: Some(path.to_string()),
            web_path: None,
            format: "jpeg".to_string(),
        })
    }

    type TestService =
        PhotoService<ScriptedCamera, MemoryPreferences, MemoryFileStore, MemoryBlobSource>;

    fn web_service(
        camera: ScriptedCamera,
        prefs: &MemoryPreferences,
        files: &MemoryFileStore,
        blobs: &MemoryBlobSource,
    ) -> TestService {
        PhotoService::new(
            GalleryConfig::default(),
            camera,
            prefs.clone(),
            files.clone(),
            &FixedPlatform(Platform::Web),
            blobs.clone(),
        )
    }

    fn native_service(
        camera: ScriptedCamera,
        prefs: &MemoryPreferences,
        files: &MemoryFileStore,
    ) -> TestService {
        PhotoService::new(
            GalleryConfig::default(),
            camera,
            prefs.clone(),
            files.clone(),
            &FixedPlatform(Platform::Native),
            MemoryBlobSource::new(),
        )
    }

    async fn stored_manifest(prefs: &MemoryPreferences) -> Vec<serde_json::Value> {
        let raw = prefs.get("photos").await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_web_end_to_end() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://x", Blob::new(b"photo bytes".to_vec(), "image/jpeg"));
        let service = web_service(ScriptedCamera::with(vec![web_ref("blob://x")]), &prefs, &files, &blobs);

        assert!(service.load_saved().await.unwrap().is_empty());

        let photo = service.capture().await.unwrap();
        assert_eq!(photo.webview_path.as_deref(), Some("blob://x"));
        let stem = photo.filepath.strip_suffix(".jpeg").unwrap();
        assert!(stem.parse::<i64>().is_ok());
        assert_eq!(service.photos(), vec![photo.clone()]);

        let manifest = stored_manifest(&prefs).await;
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0]["filepath"], photo.filepath.as_str());
        assert!(manifest[0].get("webview_path").is_none());

        assert_eq!(
            files.get(&photo.filepath, Directory::Data).unwrap(),
            b"photo bytes"
        );
    }

    #[tokio::test]
    async fn test_capture_prepends_newest_first() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        blobs.register("blob://b", Blob::new(vec![2], "image/jpeg"));
        let camera = ScriptedCamera::with(vec![web_ref("blob://a"), web_ref("blob://b")]);
        let service = web_service(camera, &prefs, &files, &blobs);

        let first = service.capture().await.unwrap();
        assert_eq!(service.photos().len(), 1);
        assert_eq!(stored_manifest(&prefs).await.len(), 1);

        let second = service.capture().await.unwrap();
        let photos = service.photos();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0], second);
        assert_eq!(photos[1], first);
        assert_ne!(first.filepath, second.filepath);
        assert_eq!(stored_manifest(&prefs).await.len(), photos.len());
    }

    #[tokio::test]
    async fn test_web_round_trip_decodes_to_written_bytes() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        blobs.register("blob://x", Blob::new(bytes.clone(), "image/jpeg"));
        let service = web_service(ScriptedCamera::with(vec![web_ref("blob://x")]), &prefs, &files, &blobs);
        let saved = service.capture().await.unwrap();

        let reloaded = web_service(ScriptedCamera::default(), &prefs, &files, &blobs);
        let photos = reloaded.load_saved().await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].filepath, saved.filepath);

        let data_url = photos[0].webview_path.clone().unwrap();
        let payload = data_url.strip_prefix("data:image/jpeg;base64,").unwrap();
        assert_eq!(general_purpose::STANDARD.decode(payload).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_load_twice_is_idempotent() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        blobs.register("blob://b", Blob::new(vec![2], "image/jpeg"));
        let camera = ScriptedCamera::with(vec![web_ref("blob://a"), web_ref("blob://b")]);
        let service = web_service(camera, &prefs, &files, &blobs);
        service.capture().await.unwrap();
        service.capture().await.unwrap();

        let first = service.load_saved().await.unwrap();
        let second = service.load_saved().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.photos(), second);
    }

    #[tokio::test]
    async fn test_corrupt_manifest_loads_empty() {
        let prefs = MemoryPreferences::new();
        prefs.set("photos", "{not json").await.unwrap();
        let files = MemoryFileStore::new();
        let service = web_service(ScriptedCamera::default(), &prefs, &files, &MemoryBlobSource::new());

        assert!(service.load_saved().await.unwrap().is_empty());
        assert!(service.photos().is_empty());
        assert_eq!(files.read_count(), 0);
    }

    #[tokio::test]
    async fn test_null_manifest_loads_empty() {
        let prefs = MemoryPreferences::new();
        prefs.set("photos", "null").await.unwrap();
        let service = web_service(
            ScriptedCamera::default(),
            &prefs,
            &MemoryFileStore::new(),
            &MemoryBlobSource::new(),
        );
        assert!(service.load_saved().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_replaces_previous_state() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        let service = web_service(ScriptedCamera::with(vec![web_ref("blob://a")]), &prefs, &files, &blobs);
        service.capture().await.unwrap();

        prefs.set("photos", "[]").await.unwrap();
        assert!(service.load_saved().await.unwrap().is_empty());
        assert!(service.photos().is_empty());
    }

    #[tokio::test]
    async fn test_web_load_reads_each_photo_once() {
        let prefs = MemoryPreferences::new();
        prefs
            .set(
                "photos",
                r#"[{"filepath":"3.jpeg"},{"filepath":"2.jpeg"},{"filepath":"1.jpeg"}]"#,
            )
            .await
            .unwrap();
        let files = MemoryFileStore::new();
        for name in ["1.jpeg", "2.jpeg", "3.jpeg"] {
            files.insert_absolute(&format!("/data/{}", name), vec![7]);
        }
        let service = web_service(ScriptedCamera::default(), &prefs, &files, &MemoryBlobSource::new());

        let photos = service.load_saved().await.unwrap();
        assert_eq!(photos.len(), 3);
        assert_eq!(files.read_count(), photos.len());
        assert!(photos
            .iter()
            .all(|p| p.webview_path.as_deref() == Some("data:image/jpeg;base64,Bw==")));
    }

    #[tokio::test]
    async fn test_native_load_never_reads_files() {
        let prefs = MemoryPreferences::new();
        prefs
            .set(
                "photos",
                r#"[{"filepath":"file:///data/2.jpeg"},{"filepath":"file:///data/1.jpeg"}]"#,
            )
            .await
            .unwrap();
        let files = MemoryFileStore::new();
        let service = native_service(ScriptedCamera::default(), &prefs, &files);

        let photos = service.load_saved().await.unwrap();
        assert_eq!(files.read_count(), 0);
        assert_eq!(photos.len(), 2);
        assert_eq!(
            photos[0].webview_path.as_deref(),
            Some("http://localhost/_app_file_/data/2.jpeg")
        );
    }

    #[tokio::test]
    async fn test_native_capture_uses_file_uri() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        files.insert_absolute("/camera/IMG_1.jpg", b"native".to_vec());
        let service = native_service(
            ScriptedCamera::with(vec![native_ref("/camera/IMG_1.jpg")]),
            &prefs,
            &files,
        );

        let photo = service.capture().await.unwrap();
        assert!(photo.filepath.starts_with("file:///data/"));
        assert!(photo.filepath.ends_with(".jpeg"));
        let expected = photo
            .filepath
            .replacen("file://", "http://localhost/_app_file_", 1);
        assert_eq!(photo.webview_path.as_deref(), Some(expected.as_str()));

        let reloaded = native_service(ScriptedCamera::default(), &prefs, &files);
        let photos = reloaded.load_saved().await.unwrap();
        assert_eq!(photos, vec![photo]);
    }

    #[tokio::test]
    async fn test_cancelled_capture_changes_nothing() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let camera = ScriptedCamera::with(vec![Err(PickerError::Cancelled("closed".into()))]);
        let service = web_service(camera, &prefs, &files, &MemoryBlobSource::new());

        let result = service.capture().await;
        assert!(matches!(result, Err(GalleryError::CaptureCancelled(_))));
        assert!(service.photos().is_empty());
        assert!(files.is_empty());
        assert_eq!(prefs.get("photos").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_permission_denied_changes_nothing() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let camera =
            ScriptedCamera::with(vec![Err(PickerError::PermissionDenied("camera".into()))]);
        let service = native_service(camera, &prefs, &files);

        let result = service.capture().await;
        assert!(matches!(result, Err(GalleryError::PermissionDenied(_))));
        assert!(service.photos().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_adds_no_photo() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        blobs.register("blob://b", Blob::new(vec![2], "image/jpeg"));
        let camera = ScriptedCamera::with(vec![web_ref("blob://a"), web_ref("blob://b")]);
        let service = web_service(camera, &prefs, &files, &blobs);
        service.capture().await.unwrap();
        let before = service.photos();

        files.set_fail_writes(true);
        let result = service.capture().await;
        assert!(matches!(result, Err(GalleryError::StorageWriteFailed(_))));
        assert_eq!(service.photos(), before);
        assert_eq!(stored_manifest(&prefs).await.len(), 1);
    }

    #[tokio::test]
    async fn test_manifest_write_failure_keeps_photos() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        blobs.register("blob://b", Blob::new(vec![2], "image/jpeg"));
        let camera = ScriptedCamera::with(vec![web_ref("blob://a"), web_ref("blob://b")]);
        let service = web_service(camera, &prefs, &files, &blobs);
        service.capture().await.unwrap();
        let before = service.photos();

        prefs.set_fail_writes(true);
        let result = service.capture().await;
        assert!(matches!(result, Err(GalleryError::PreferencesUnavailable(_))));
        assert_eq!(service.photos(), before);
        assert_eq!(stored_manifest(&prefs).await.len(), 1);
        // The payload was written before the manifest was rejected
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn test_load_fails_when_store_offline() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        let service = web_service(ScriptedCamera::with(vec![web_ref("blob://a")]), &prefs, &files, &blobs);
        let photo = service.capture().await.unwrap();

        prefs.set_offline(true);
        let result = service.load_saved().await;
        assert!(matches!(result, Err(GalleryError::PreferencesUnavailable(_))));
        assert_eq!(service.photos(), vec![photo]);
        assert_eq!(files.read_count(), 0);
    }

    #[tokio::test]
    async fn test_overlapping_captures_keep_both_photos() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        blobs.register("blob://b", Blob::new(vec![2], "image/jpeg"));
        let camera = ScriptedCamera::with(vec![web_ref("blob://a"), web_ref("blob://b")]);
        let service = web_service(camera, &prefs, &files, &blobs);

        let (first, second) = tokio::join!(service.capture(), service.capture());
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_ne!(first.filepath, second.filepath);

        let photos = service.photos();
        assert_eq!(photos.len(), 2);
        assert!(photos.contains(&first));
        assert!(photos.contains(&second));
        assert_eq!(stored_manifest(&prefs).await.len(), 2);
        assert_eq!(files.len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_photo_kept_without_display_source() {
        let prefs = MemoryPreferences::new();
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        blobs.register("blob://b", Blob::new(vec![2], "image/jpeg"));
        let camera = ScriptedCamera::with(vec![web_ref("blob://a"), web_ref("blob://b")]);
        let service = web_service(camera, &prefs, &files, &blobs);
        let lost = service.capture().await.unwrap();
        let kept = service.capture().await.unwrap();
        files.remove(&lost.filepath, Directory::Data);

        let photos = service.load_saved().await.unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].filepath, kept.filepath);
        assert!(photos[0].webview_path.is_some());
        assert_eq!(photos[1].filepath, lost.filepath);
        assert_eq!(photos[1].webview_path, None);
    }

    #[test]
    fn test_duplicate_manifest_entries_collapse() {
        let photos =
            parse_manifest(r#"[{"filepath":"2.jpeg"},{"filepath":"1.jpeg"},{"filepath":"2.jpeg"}]"#)
                .unwrap();
        let keys: Vec<_> = photos.iter().map(|p| p.filepath.as_str()).collect();
        assert_eq!(keys, vec!["2.jpeg", "1.jpeg"]);
    }

    #[tokio::test]
    async fn test_subscribers_see_new_photos() {
        let prefs = MemoryPreferences::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1], "image/jpeg"));
        let service = web_service(
            ScriptedCamera::with(vec![web_ref("blob://a")]),
            &prefs,
            &MemoryFileStore::new(),
            &blobs,
        );
        let mut updates = service.subscribe();

        let photo = service.capture().await.unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(*updates.borrow_and_update(), vec![photo]);
    }

    #[tokio::test]
    async fn test_sqlite_backed_gallery_survives_restart() {
        let path = std::env::temp_dir().join(format!(
            "photo_gallery_service_{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let files = MemoryFileStore::new();
        let blobs = MemoryBlobSource::new();
        blobs.register("blob://a", Blob::new(vec![1, 2], "image/jpeg"));

        let saved = {
            let service = PhotoService::new(
                GalleryConfig::default(),
                ScriptedCamera::with(vec![web_ref("blob://a")]),
                SqlitePreferences::open(&path).unwrap(),
                files.clone(),
                &FixedPlatform(Platform::Web),
                blobs.clone(),
            );
            service.capture().await.unwrap()
        };

        let service = PhotoService::new(
            GalleryConfig::default(),
            ScriptedCamera::default(),
            SqlitePreferences::open(&path).unwrap(),
            files.clone(),
            &FixedPlatform(Platform::Web),
            blobs,
        );
        let photos = service.load_saved().await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].filepath, saved.filepath);
        assert_eq!(photos[0].webview_path.as_deref(), Some("data:image/jpeg;base64,AQI="));

        let _ = std::fs::remove_file(&path);
    }
}
