//! Fetching browser-side photo references and turning them into data URLs.

use crate::filesystem::FileStoreError;
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Binary payload with its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Resolves a browser-accessible reference (`blob:`, `http:`, `file:` ...) to its bytes
#[allow(async_fn_in_trait)]
pub trait BlobFetcher {
    async fn fetch(&self, url: &str) -> Result<Blob, FileStoreError>;
}

/// Reads a blob as a `data:<mime>;base64,<payload>` URL.
///
/// Runs on the blocking pool and resumes the caller once encoding finished.
pub async fn read_as_data_url(blob: Blob) -> Result<String, FileStoreError> {
    tokio::task::spawn_blocking(move || {
        let mime = if blob.mime_type.is_empty() {
            "application/octet-stream"
        } else {
            blob.mime_type.as_str()
        };
        format!(
            "data:{};base64,{}",
            mime,
            general_purpose::STANDARD.encode(&blob.bytes)
        )
    })
    .await
    .map_err(|e| FileStoreError::ReadFailed(format!("Blob reader failed: {}", e)))
}

/// Splits the base64 payload off a `data:` URL
pub fn data_url_payload(data_url: &str) -> Result<&str, FileStoreError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| FileStoreError::InvalidData("not a data URL".to_string()))?;
    match rest.split_once(',') {
        Some((header, payload)) if header.ends_with(";base64") => Ok(payload),
        _ => Err(FileStoreError::InvalidData(
            "data URL is not base64 encoded".to_string(),
        )),
    }
}

/// Builds the data URL for a stored photo. The MIME type is always JPEG,
/// matching the extension photos are written with.
pub fn jpeg_data_url(base64_payload: &str) -> String {
    format!("data:image/jpeg;base64,{}", base64_payload)
}

/// Guesses a MIME type from a reference's extension, falling back to JPEG
pub fn guess_mime(url: &str) -> &'static str {
    let ext = url
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" | "heif" => "image/heic",
        _ => "image/jpeg",
    }
}

/// Blob references registered in memory, the way a browser keeps
/// `blob:` object URLs alive for the page.
#[derive(Clone, Debug, Default)]
pub struct MemoryBlobSource {
    blobs: Arc<Mutex<HashMap<String, Blob>>>,
}

impl MemoryBlobSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, url: impl Into<String>, blob: Blob) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(url.into(), blob);
        }
    }

    pub fn revoke(&self, url: &str) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.remove(url);
        }
    }
}

impl BlobFetcher for MemoryBlobSource {
    async fn fetch(&self, url: &str) -> Result<Blob, FileStoreError> {
        self.blobs
            .lock()
            .map_err(|e| FileStoreError::ReadFailed(e.to_string()))?
            .get(url)
            .cloned()
            .ok_or_else(|| FileStoreError::ReadFailed(format!("Unknown blob reference: {}", url)))
    }
}

/// Fetches `file://` references and plain paths from the local filesystem
#[derive(Clone, Debug, Default)]
pub struct FsBlobFetcher;

impl BlobFetcher for FsBlobFetcher {
    async fn fetch(&self, url: &str) -> Result<Blob, FileStoreError> {
        let path = url.strip_prefix("file://").unwrap_or(url).to_string();
        let mime_type = guess_mime(&path);

        tokio::task::spawn_blocking(move || -> Result<Blob, FileStoreError> {
            let bytes = std::fs::read(&path)
                .map_err(|e| FileStoreError::ReadFailed(format!("{}: {}", path, e)))?;
            Ok(Blob::new(bytes, mime_type))
        })
        .await
        .map_err(|e| FileStoreError::ReadFailed(format!("Task join error: {}", e)))?
    }
}

/// Fetches `http(s)://` references
#[cfg(feature = "http-fetch")]
#[derive(Clone, Debug, Default)]
pub struct HttpBlobFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http-fetch")]
impl HttpBlobFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http-fetch")]
impl BlobFetcher for HttpBlobFetcher {
    async fn fetch(&self, url: &str) -> Result<Blob, FileStoreError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FileStoreError::ReadFailed(format!("Fetch {} failed: {}", url, e)))?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| guess_mime(url).to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FileStoreError::ReadFailed(format!("Reading {} failed: {}", url, e)))?;

        Ok(Blob::new(bytes.to_vec(), mime_type))
    }
}
