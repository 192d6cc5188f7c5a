use crate::errors::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub trait KeyValueStorage {
    fn read(&self, key: &str) -> AppResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for &T {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        (**self).remove(key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("memory storage mutex poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("memory storage mutex poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("memory storage mutex poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStorage, MemoryStorage};
    use std::sync::Arc;

    #[test]
    fn memory_storage_overwrites_and_removes() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read("k").expect("read"), None);

        storage.write("k", "one").expect("write");
        storage.write("k", "two").expect("overwrite");
        assert_eq!(storage.read("k").expect("read").as_deref(), Some("two"));

        storage.remove("k").expect("remove");
        assert_eq!(storage.read("k").expect("read"), None);
    }

    #[test]
    fn shared_handles_see_the_same_entries() {
        let storage = Arc::new(MemoryStorage::new());
        let other = Arc::clone(&storage);
        other.write("k", "v").expect("write");
        assert_eq!(storage.read("k").expect("read").as_deref(), Some("v"));
    }
}
