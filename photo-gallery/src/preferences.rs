//! Durable key-value storage for the gallery manifest.

use crate::schema::init_preferences_schema;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// The underlying storage could not be reached
#[derive(Debug)]
pub enum PreferencesError {
    DatabaseError(rusqlite::Error),
    Unavailable(String),
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferencesError::DatabaseError(e) => write!(f, "Database error: {}", e),
            PreferencesError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
        }
    }
}

impl std::error::Error for PreferencesError {}

impl From<rusqlite::Error> for PreferencesError {
    fn from(err: rusqlite::Error) -> Self {
        PreferencesError::DatabaseError(err)
    }
}

/// String key-value store persisted across app restarts
// Non-Send futures: the gallery is driven from the UI task.
#[allow(async_fn_in_trait)]
pub trait PreferencesStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PreferencesError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError>;
}

/// In-memory preferences for tests and browser builds without storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryPreferences {
    values: Arc<Mutex<HashMap<String, String>>>,
    offline: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following read and write fail
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes every following write fail while reads keep working
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), PreferencesError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PreferencesError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

impl PreferencesStore for MemoryPreferences {
    async fn get(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        self.check_online()?;
        let values = self
            .values
            .lock()
            .map_err(|e| PreferencesError::Unavailable(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError> {
        self.check_online()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PreferencesError::Unavailable("write rejected".to_string()));
        }
        self.values
            .lock()
            .map_err(|e| PreferencesError::Unavailable(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed preferences for native and desktop builds
#[derive(Debug)]
pub struct SqlitePreferences {
    conn: Mutex<Connection>,
}

impl SqlitePreferences {
    /// Opens (and creates if needed) the preferences database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PreferencesError::Unavailable(format!("{:?}: {}", parent, e)))?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, PreferencesError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, PreferencesError> {
        init_preferences_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl PreferencesStore for SqlitePreferences {
    async fn get(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PreferencesError::Unavailable(e.to_string()))?;
        let value = conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PreferencesError::Unavailable(e.to_string()))?;
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }
}
