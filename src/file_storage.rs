// File-backed key-value storage: one JSON file per key

use crate::storage::{KeyValueStorage, validate_key};
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LOCK_FILE: &str = ".lock";

/// Storage that keeps each key in `<dir>/<key>.json`
///
/// Writes go to a temp file first and are renamed into place while holding an
/// exclusive lock on `<dir>/.lock`, so a reader never sees a half-written slot.
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open or create a storage directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create storage directory")?;
        info!(path = ?base_path, "Opened file storage");
        Ok(Self { base_path })
    }

    /// Get the base path of this storage
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file holding `key`
    pub fn item_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(LOCK_FILE))
            .context("Failed to open lock file")?;
        file.lock_exclusive().context("Failed to acquire file lock")?;
        Ok(file)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.item_path(key);

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.item_path(key);
        let tmp_path = self.base_path.join(format!("{}.json.tmp", key));

        // Lock is released when dropped
        let _lock = self.lock()?;

        let mut file = File::create(&tmp_path).context("Failed to create temp file")?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?; // Ensure data is flushed to disk
        drop(file);

        fs::rename(&tmp_path, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!(key, bytes = value.len(), "Wrote storage item");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.item_path(key);
        let _lock = self.lock()?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("store");

        let storage = FileStorage::open(&dir).unwrap();
        assert!(dir.exists());
        assert_eq!(storage.base_path(), dir.as_path());
    }

    #[test]
    fn test_get_missing_key() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::open(temp.path()).unwrap();

        assert_eq!(storage.get_item("azure-tasks").unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        storage.set_item("azure-tasks", r#"[{"id":1}]"#).unwrap();

        let path = temp.path().join("azure-tasks.json");
        assert!(path.exists());
        assert!(!temp.path().join("azure-tasks.json.tmp").exists());
        assert_eq!(fs::read_to_string(path).unwrap(), r#"[{"id":1}]"#);
        assert_eq!(
            storage.get_item("azure-tasks").unwrap(),
            Some(r#"[{"id":1}]"#.to_string())
        );
    }

    #[test]
    fn test_set_overwrites() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        storage.set_item("k", "a much longer first value").unwrap();
        storage.set_item("k", "short").unwrap();

        assert_eq!(storage.get_item("k").unwrap(), Some("short".to_string()));
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut storage = FileStorage::open(temp.path()).unwrap();
            storage.set_item("k", "v").unwrap();
        }

        let storage = FileStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get_item("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_remove_item() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        storage.set_item("k", "v").unwrap();
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);

        // Missing key is fine
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        assert!(storage.set_item("../outside", "v").is_err());
        assert!(storage.get_item("a/b").is_err());
    }
}
