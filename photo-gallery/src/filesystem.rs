//! File store used for photo payloads.
//!
//! Payloads cross the [`FileStore`] boundary as base64 strings, the same shape
//! the camera and blob readers produce. Implementations decode them before
//! writing and encode again on read.

use crate::models::Directory;
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Error type for file store operations
#[derive(Debug)]
pub enum FileStoreError {
    /// Write failed (storage full, permissions, ...)
    WriteFailed(String),
    /// Read failed or the file does not exist
    ReadFailed(String),
    /// Payload was not valid base64
    InvalidData(String),
    IoError(std::io::Error),
}

impl std::fmt::Display for FileStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStoreError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            FileStoreError::ReadFailed(msg) => write!(f, "Read failed: {}", msg),
            FileStoreError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            FileStoreError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for FileStoreError {}

impl From<std::io::Error> for FileStoreError {
    fn from(err: std::io::Error) -> Self {
        FileStoreError::IoError(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFileOptions {
    pub path: String,
    /// Base64 payload
    pub data: String,
    pub directory: Directory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFileResult {
    /// Canonical URI of the written file
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFileOptions {
    pub path: String,
    /// `None` reads `path` as an absolute path or `file://` URI
    pub directory: Option<Directory>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFileResult {
    /// Base64 payload
    pub data: String,
}

/// Durable storage for photo payloads
// Futures are not required to be Send; the gallery runs on the UI task.
#[allow(async_fn_in_trait)]
pub trait FileStore {
    async fn write_file(&self, options: WriteFileOptions)
        -> Result<WriteFileResult, FileStoreError>;

    async fn read_file(&self, options: ReadFileOptions) -> Result<ReadFileResult, FileStoreError>;
}

fn decode_payload(data: &str) -> Result<Vec<u8>, FileStoreError> {
    general_purpose::STANDARD
        .decode(data)
        .map_err(|e| FileStoreError::InvalidData(e.to_string()))
}

fn strip_file_scheme(path: &str) -> &str {
    path.strip_prefix("file://").unwrap_or(path)
}

/// Filesystem-backed store for native and desktop builds.
///
/// `Directory::Data` maps to the base directory itself, the other
/// directories to subfolders of it.
#[derive(Clone, Debug)]
pub struct LocalFileStore {
    base: PathBuf,
}

impl LocalFileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn directory_path(&self, directory: Directory) -> PathBuf {
        match directory {
            Directory::Data => self.base.clone(),
            Directory::Documents => self.base.join("documents"),
            Directory::Cache => self.base.join("cache"),
        }
    }

    /// Paths inside a directory must stay inside it: no roots, no `..`
    fn resolve(&self, path: &str, directory: Option<Directory>) -> Result<PathBuf, FileStoreError> {
        let Some(dir) = directory else {
            return Ok(PathBuf::from(strip_file_scheme(path)));
        };
        let relative = Path::new(path);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained || path.is_empty() {
            return Err(FileStoreError::InvalidData(format!(
                "{:?} is outside the {} directory",
                path,
                dir.as_str()
            )));
        }
        Ok(self.directory_path(dir).join(relative))
    }
}

fn file_uri(path: &Path) -> String {
    let display = path.to_string_lossy();
    if display.starts_with('/') {
        format!("file://{}", display)
    } else {
        format!("file:///{}", display.replace('\\', "/"))
    }
}

impl FileStore for LocalFileStore {
    async fn write_file(
        &self,
        options: WriteFileOptions,
    ) -> Result<WriteFileResult, FileStoreError> {
        let bytes = decode_payload(&options.data)?;
        let target = self.resolve(&options.path, Some(options.directory))?;

        tokio::task::spawn_blocking(move || -> Result<WriteFileResult, FileStoreError> {
            log::debug!("Writing {} bytes to {:?}", bytes.len(), target);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| FileStoreError::WriteFailed(format!("{:?}: {}", parent, e)))?;
            }
            std::fs::write(&target, &bytes)
                .map_err(|e| FileStoreError::WriteFailed(format!("{:?}: {}", target, e)))?;
            let absolute = std::fs::canonicalize(&target)?;
            Ok(WriteFileResult {
                uri: file_uri(&absolute),
            })
        })
        .await
        .map_err(|e| FileStoreError::WriteFailed(format!("Task join error: {}", e)))?
    }

    async fn read_file(&self, options: ReadFileOptions) -> Result<ReadFileResult, FileStoreError> {
        let source = self.resolve(&options.path, options.directory)?;

        tokio::task::spawn_blocking(move || -> Result<ReadFileResult, FileStoreError> {
            let bytes = std::fs::read(&source)
                .map_err(|e| FileStoreError::ReadFailed(format!("{:?}: {}", source, e)))?;
            Ok(ReadFileResult {
                data: general_purpose::STANDARD.encode(bytes),
            })
        })
        .await
        .map_err(|e| FileStoreError::ReadFailed(format!("Task join error: {}", e)))?
    }
}

/// In-memory file store for browser builds and tests.
///
/// Files live under `/<directory>/<path>` keys; URIs returned by writes are
/// `file://` URIs of those keys, so they can be read back with no directory.
#[derive(Clone, Debug, Default)]
pub struct MemoryFileStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    reads: Arc<AtomicUsize>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &str, directory: Option<Directory>) -> String {
        match directory {
            Some(dir) => format!("/{}/{}", dir.as_str(), path),
            None => strip_file_scheme(path).to_string(),
        }
    }

    /// Places a file at an absolute path, e.g. where a camera left its capture
    pub fn insert_absolute(&self, path: &str, bytes: Vec<u8>) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(Self::key(path, None), bytes);
        }
    }

    pub fn remove(&self, path: &str, directory: Directory) -> Option<Vec<u8>> {
        self.files.lock().ok()?.remove(&Self::key(path, Some(directory)))
    }

    pub fn get(&self, path: &str, directory: Directory) -> Option<Vec<u8>> {
        self.files
            .lock()
            .ok()?
            .get(&Self::key(path, Some(directory)))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `read_file` calls served so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Makes every following write fail, simulating a full disk
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }
}

impl FileStore for MemoryFileStore {
    async fn write_file(
        &self,
        options: WriteFileOptions,
    ) -> Result<WriteFileResult, FileStoreError> {
        if self.fail_writes.lock().map(|flag| *flag).unwrap_or(false) {
            return Err(FileStoreError::WriteFailed("storage full".to_string()));
        }
        let bytes = decode_payload(&options.data)?;
        let key = Self::key(&options.path, Some(options.directory));
        self.files
            .lock()
            .map_err(|e| FileStoreError::WriteFailed(e.to_string()))?
            .insert(key.clone(), bytes);
        Ok(WriteFileResult {
            uri: format!("file://{}", key),
        })
    }

    async fn read_file(&self, options: ReadFileOptions) -> Result<ReadFileResult, FileStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let key = Self::key(&options.path, options.directory);
        let files = self
            .files
            .lock()
            .map_err(|e| FileStoreError::ReadFailed(e.to_string()))?;
        let bytes = files
            .get(&key)
            .ok_or_else(|| FileStoreError::ReadFailed(format!("No such file: {}", key)))?;
        Ok(ReadFileResult {
            data: general_purpose::STANDARD.encode(bytes),
        })
    }
}
