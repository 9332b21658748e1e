// SQLite-backed key-value storage

use crate::storage::{KeyValueStorage, validate_key};
use crate::task::now_ms;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

/// Storage that keeps every key as a row of a single `kv` table
pub struct SqliteStorage {
    db: Connection,
}

impl SqliteStorage {
    /// Open or create a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }

        let db = Connection::open(path).context("Failed to open SQLite database")?;
        let storage = Self { db };
        storage.create_schema()?;

        info!(path = ?path, "Opened SQLite storage");
        Ok(storage)
    }

    /// Get a reference to the SQLite database connection
    pub fn db(&self) -> &Connection {
        &self.db
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating kv schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .context("Failed to read storage item")?;

        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        self.db
            .execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, now_ms()],
            )
            .context("Failed to write storage item")?;

        debug!(key, bytes = value.len(), "Wrote storage item");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;

        self.db
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .context("Failed to remove storage item")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp(temp: &TempDir) -> SqliteStorage {
        SqliteStorage::open(temp.path().join("tasklist.db")).unwrap()
    }

    #[test]
    fn test_open_creates_database() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("data").join("tasklist.db");

        let _storage = SqliteStorage::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_get_missing_key() {
        let temp = TempDir::new().unwrap();
        let storage = open_temp(&temp);
        assert_eq!(storage.get_item("azure-tasks").unwrap(), None);
    }

    #[test]
    fn test_set_get_overwrite_remove() {
        let temp = TempDir::new().unwrap();
        let mut storage = open_temp(&temp);

        storage.set_item("azure-tasks", "[]").unwrap();
        assert_eq!(storage.get_item("azure-tasks").unwrap(), Some("[]".to_string()));

        storage.set_item("azure-tasks", "[1]").unwrap();
        assert_eq!(storage.get_item("azure-tasks").unwrap(), Some("[1]".to_string()));

        let rows: i64 = storage
            .db()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);

        storage.remove_item("azure-tasks").unwrap();
        assert_eq!(storage.get_item("azure-tasks").unwrap(), None);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("tasklist.db");
        {
            let mut storage = SqliteStorage::open(&db_path).unwrap();
            storage.set_item("k", "v").unwrap();
        }

        let storage = SqliteStorage::open(&db_path).unwrap();
        assert_eq!(storage.get_item("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_rejects_invalid_key() {
        let temp = TempDir::new().unwrap();
        let mut storage = open_temp(&temp);
        assert!(storage.set_item("", "v").is_err());
    }
}
