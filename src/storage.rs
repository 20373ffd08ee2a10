//! Device-local key/value backends

use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

use crate::app_dirs::AppDirs;
use crate::error::{StorageError, StorageResult};

/// String keys to string values, last write wins
pub trait KeyValueStore: std::fmt::Debug {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
    /// Returns true when the key existed
    fn remove(&mut self, key: &str) -> StorageResult<bool>;
    fn keys(&self) -> StorageResult<Vec<String>>;
}

/// In-memory stand-in when the database cannot be opened, and for tests
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// SQLite-backed store, one row per key
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database under the application state directory
    pub fn open_default() -> StorageResult<Self> {
        let path = AppDirs::db_path()
            .ok_or_else(|| StorageError::Unavailable("no home or data directory".to_string()))?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<bool> {
        let removed = self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(store: &mut dyn KeyValueStore) {
        assert_eq!(store.get("best-level-simon").unwrap(), None);

        store.set("best-level-simon", "4").unwrap();
        store.set("best-level-simon", "6").unwrap();
        store.set("cookie-consent", "{}").unwrap();
        assert_eq!(store.get("best-level-simon").unwrap().as_deref(), Some("6"));
        assert_eq!(store.keys().unwrap(), vec!["best-level-simon", "cookie-consent"]);

        assert!(store.remove("best-level-simon").unwrap());
        assert!(!store.remove("best-level-simon").unwrap());
        assert_eq!(store.get("best-level-simon").unwrap(), None);
    }

    #[test]
    fn test_memory_store() {
        exercise(&mut MemoryStore::new());
    }

    #[test]
    fn test_sqlite_store_in_memory() {
        exercise(&mut SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_store_persists_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("best-wpm-typing", "40").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("best-wpm-typing").unwrap().as_deref(), Some("40"));
    }
}
