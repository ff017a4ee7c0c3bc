//! Local key/value persistence
//!
//! Session history is kept as a single serialized string under a fixed
//! key. [`SqliteStorage`] writes it to a database file in the user's data
//! directory; [`MemoryStorage`] keeps it in process for tests.

use crate::error::{LuatbotError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub mod memory;
pub use memory::MemoryStorage;

/// String key/value persistence used by the session store
pub trait StorageBackend: Send {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Key/value storage backed by a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory.
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("vn", "luatbot", "luatbot").ok_or_else(|| {
            LuatbotError::Persistence("Could not determine data directory".into())
        })?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| LuatbotError::Persistence(e.to_string()))?;

        let storage = Self {
            db_path: data_dir.join("history.db"),
        };
        storage.init()?;

        Ok(storage)
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use luatbot::storage::{SqliteStorage, StorageBackend};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("history.db")).unwrap();
    /// storage.set("chatHistory", "[]").unwrap();
    /// assert_eq!(storage.get("chatHistory").unwrap().as_deref(), Some("[]"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| LuatbotError::Persistence(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// Open the storage at `path`, or at the default location when `None`
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::new_with_path(p),
            None => Self::new(),
        }
    }

    /// Location of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| LuatbotError::Persistence(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| LuatbotError::Persistence(e.to_string()))?;

        Ok(())
    }
}

impl StorageBackend for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;

        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("Failed to read stored value")
            .map_err(|e| LuatbotError::Persistence(e.to_string()))?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .context("Failed to write stored value")
        .map_err(|e| LuatbotError::Persistence(e.to_string()))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connect()?;

        conn.execute("DELETE FROM local_storage WHERE key = ?", params![key])
            .context("Failed to remove stored value")
            .map_err(|e| LuatbotError::Persistence(e.to_string()))?;

        Ok(())
    }
}
