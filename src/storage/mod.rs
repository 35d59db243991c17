//! Persistence adapter.
//!
//! [`KeyValueStore`] is the swappable backend (string key → JSON text).
//! [`JsonStore`] sits on top of it and is what every component talks to: it
//! decodes values fail-closed and serializes read-modify-write cycles so
//! concurrent callers never lose updates.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryKv;
pub use sqlite::SqliteKv;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Raw key/value backend. No transactional guarantees of its own.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Opens the backend selected in config.
pub fn open_backend(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryKv::new())),
        StorageBackend::Sqlite => Ok(Arc::new(SqliteKv::open(&config.path)?)),
    }
}

/// Typed JSON view over a [`KeyValueStore`].
pub struct JsonStore {
    backend: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKv::new()))
    }

    /// Reads and decodes `key`. Malformed JSON is logged and treated as absent.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = match self.backend.get(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding unreadable value under '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    pub fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        Ok(self.read(key)?.unwrap_or_default())
    }

    /// The stored text, undecoded.
    pub fn raw(&self, key: &str) -> Result<Option<String>> {
        self.backend.get(key)
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_unlocked(key, value)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.backend.remove(key)?;
        debug!("Removed key {}", key);
        Ok(())
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.backend.keys()
    }

    /// Atomic read-modify-write of one key.
    ///
    /// `init` supplies the value when the key is missing or unreadable. The
    /// result of `f` is always written back, even if `f` changed nothing.
    pub fn update<T, R, I, F>(&self, key: &str, init: I, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize,
        I: FnOnce() -> T,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut value = self.read(key)?.unwrap_or_else(init);
        let out = f(&mut value);
        self.write_unlocked(key, &value)?;
        Ok(out)
    }

    /// [`update`](Self::update) starting from `T::default()`.
    pub fn update_default<T, R, F>(&self, key: &str, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        self.update(key, T::default, f)
    }

    fn write_unlocked<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        self.backend.set(key, &encoded)?;
        debug!("Wrote {} bytes under {}", encoded.len(), key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn malformed_json_reads_as_absent() {
        let backend = Arc::new(InMemoryKv::new());
        backend.set("broken", "{not json").unwrap();
        let store = JsonStore::new(backend);

        let value: Option<Vec<String>> = store.read("broken").unwrap();
        assert!(value.is_none());
        let fallback: Vec<String> = store.read_or_default("broken").unwrap();
        assert!(fallback.is_empty());
    }

    #[test]
    fn update_heals_corrupt_value_and_persists() {
        let backend = Arc::new(InMemoryKv::new());
        backend.set("counts", "[[[").unwrap();
        let store = JsonStore::new(backend.clone());

        let total = store
            .update_default("counts", |m: &mut HashMap<String, u64>| {
                *m.entry("a".into()).or_insert(0) += 1;
                m.len()
            })
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(backend.get("counts").unwrap().as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn update_uses_init_only_when_missing() {
        let store = JsonStore::in_memory();
        store.write("list", &vec![1u32]).unwrap();

        let len = store
            .update("list", || vec![9u32, 9, 9], |v: &mut Vec<u32>| {
                v.push(2);
                v.len()
            })
            .unwrap();
        assert_eq!(len, 2);
    }

    #[test]
    fn concurrent_updates_do_not_lose_increments() {
        let store = Arc::new(JsonStore::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store
                            .update_default("n", |n: &mut u64| *n += 1)
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let n: u64 = store.read_or_default("n").unwrap();
        assert_eq!(n, 800);
    }
}
