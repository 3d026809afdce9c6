//! Persistent key-value store.
//!
//! Every persisted entity lives under one fixed key as a JSON document. The
//! store is read and written synchronously; nothing else writes to it.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, StorageError};

pub const USER_KEY: &str = "lifeskills_user";
pub const STREAK_KEY: &str = "streak_data";
pub const DAILY_GOAL_KEY: &str = "daily_goal";
pub const MOOD_LAST_CHECKED_KEY: &str = "mood_last_checked";
pub const MOOD_HISTORY_KEY: &str = "mood_history";
pub const HAS_VISITED_KEY: &str = "has_visited";
pub const CALENDAR_EVENTS_KEY: &str = "lifeskills_calendar_events";

/// Every key owned by the app. Logout removes all of them.
pub const ALL_KEYS: [&str; 7] = [
    USER_KEY,
    STREAK_KEY,
    DAILY_GOAL_KEY,
    MOOD_LAST_CHECKED_KEY,
    MOOD_HISTORY_KEY,
    HAS_VISITED_KEY,
    CALENDAR_EVENTS_KEY,
];

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store: a single `kv` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let conn = Connection::open(path.as_ref()).map_err(|e| StorageError::OpenFailed {
            path: path_str,
            source: e,
        })?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::OpenFailed {
            path: ":memory:".to_string(),
            source: e,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
        "#,
        )
        .map_err(|e| query_failed("create kv table", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn query_failed(context: &str, source: rusqlite::Error) -> StorageError {
    StorageError::QueryFailed {
        context: context.to_string(),
        source,
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |r| {
                r.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| query_failed("get", e))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, datetime('now'))",
            params![key, value],
        )
        .map_err(|e| query_failed("set", e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .map_err(|e| query_failed("remove", e))?;
        Ok(())
    }
}

/// Process-local store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.map.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.map.lock().remove(key);
        Ok(())
    }
}

/// Read and decode a JSON value. Corrupt data reads as absent.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable stored value");
            Ok(None)
        }
    }
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::EncodeFailed {
        key: key.to_string(),
        source: e,
    })?;
    store.set(key, &raw)
}

/// Remove every app key. Each removal is attempted even if an earlier one fails.
pub fn clear_all(store: &dyn KeyValueStore) -> Result<()> {
    let mut first_err = None;
    for key in ALL_KEYS {
        if let Err(e) = store.remove(key) {
            tracing::warn!(key, "failed to clear key");
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Append-only JSON list stored under one key.
pub struct Ledger<T> {
    key: &'static str,
    _entry: std::marker::PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Ledger<T> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _entry: std::marker::PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// `None` when nothing has been stored yet (or the stored list is unreadable).
    pub fn load(&self, store: &dyn KeyValueStore) -> Result<Option<Vec<T>>> {
        read_json(store, self.key)
    }

    pub fn entries(&self, store: &dyn KeyValueStore) -> Result<Vec<T>> {
        Ok(self.load(store)?.unwrap_or_default())
    }

    pub fn append(&self, store: &dyn KeyValueStore, entry: T) -> Result<()> {
        let mut entries = self.entries(store)?;
        entries.push(entry);
        write_json(store, self.key, &entries)
    }

    pub fn list<F>(&self, store: &dyn KeyValueStore, filter: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self
            .entries(store)?
            .into_iter()
            .filter(|e| filter(e))
            .collect())
    }

    /// Write the initial list. Only used for seeding an empty ledger.
    pub fn seed(&self, store: &dyn KeyValueStore, entries: &[T]) -> Result<()> {
        write_json(store, self.key, entries)
    }
}
