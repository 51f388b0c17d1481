//! Key-value persistence backends for session state.
//!
//! The session store serializes its whole aggregate as one JSON blob and
//! writes it under a well-known key; the backend only needs to round-trip
//! string blobs. Two backends are provided:
//! - `SqliteStateStore`: file-backed, WAL mode, for production use
//! - `MemoryStateStore`: HashMap-backed, for tests and ephemeral runs

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;

/// Well-known key the auth aggregate is stored under.
pub const AUTH_STORAGE_KEY: &str = "skoola.auth";

/// Failures raised by a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite failure: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("state codec failure: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Blob-level read/write contract the session store persists through.
///
/// Implementations must be safe to share across threads; the store calls
/// `write` while holding its own state lock, so backends should not block
/// for long.
pub trait StateStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

// ── SQLite backend ──────────────────────────────────────────────

/// SQLite-backed key-value store.
pub struct SqliteStateStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteStateStore {
    /// Open (or create) the state database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        let conn = rusqlite::Connection::open(db_path)?;

        // WAL mode for crash safety; busy_timeout in case another skoolactl
        // invocation holds the write lock.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::init_tables(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for tests).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Self::init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_tables(conn: &rusqlite::Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl StateStore for SqliteStateStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        );
        match row {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, now],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }
}

// ── In-memory backend ───────────────────────────────────────────

/// HashMap-backed store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: Mutex<HashMap<String, String>>,
}

impl StateStore for MemoryStateStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────
