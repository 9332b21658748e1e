// Key-value persistence slot abstraction

use eyre::{Result, eyre};
use std::collections::HashMap;

/// A durable key-value medium holding string values under named keys
///
/// Implementations overwrite the whole value on `set_item`; there is no
/// partial update. A missing key reads back as `None`.
pub trait KeyValueStorage {
    /// Read the value stored under `key`, if any
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    ///
    /// Completes the `localStorage`-style surface; `TaskStore` itself always
    /// overwrites its slot rather than removing it.
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &mut S {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// In-process storage, lost when dropped
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.items.remove(key);
        Ok(())
    }
}

/// Validate a storage key
///
/// Keys double as file names for `FileStorage`, so they are restricted to
/// alphanumerics plus `_`, `-` and `.`, and may not start with `.`.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.chars().count() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if key.starts_with('.') {
        return Err(eyre!("Storage key cannot start with '.': {}", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.') {
        return Err(eyre!(
            "Invalid storage key: {} (must be alphanumeric with _/-/.)",
            key
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_get_missing() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("missing").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_set_get_remove() {
        let mut storage = MemoryStorage::new();

        storage.set_item("azure-tasks", "[]").unwrap();
        assert_eq!(storage.get_item("azure-tasks").unwrap(), Some("[]".to_string()));
        assert_eq!(storage.len(), 1);

        storage.set_item("azure-tasks", "[1]").unwrap();
        assert_eq!(storage.get_item("azure-tasks").unwrap(), Some("[1]".to_string()));
        assert_eq!(storage.len(), 1);

        storage.remove_item("azure-tasks").unwrap();
        assert_eq!(storage.get_item("azure-tasks").unwrap(), None);
        assert!(storage.is_empty());

        // Removing again is fine
        storage.remove_item("azure-tasks").unwrap();
    }

    fn write_through<S: KeyValueStorage>(mut storage: S) {
        storage.set_item("k", "v").unwrap();
    }

    #[test]
    fn test_boxed_and_borrowed_storage() {
        let mut inner = MemoryStorage::new();
        write_through(&mut inner);
        assert_eq!(inner.get_item("k").unwrap(), Some("v".to_string()));

        let mut boxed: Box<dyn KeyValueStorage> = Box::new(inner);
        boxed.set_item("k", "w").unwrap();
        assert_eq!(boxed.get_item("k").unwrap(), Some("w".to_string()));
    }

    #[test]
    fn test_validate_key() {
        // Valid
        assert!(validate_key("azure-tasks").is_ok());
        assert!(validate_key("tasks_v1.backup").is_ok());

        // Invalid
        assert!(validate_key("").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
        // Length counts characters, not bytes
        assert!(validate_key(&"任".repeat(40)).is_ok());
        assert!(validate_key(&"任".repeat(65)).is_err());
    }

    #[test]
    fn test_memory_storage_rejects_invalid_key() {
        let mut storage = MemoryStorage::new();
        assert!(storage.set_item("bad/key", "x").is_err());
        assert!(storage.get_item("").is_err());
    }
}
