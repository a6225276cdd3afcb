// src/store/mod.rs

//! Settings store abstractions.
//!
//! A small persisted key-value contract shared by the map cache, the audit
//! coordinator and the ignore registry. Keys are slash-separated paths
//! (`audit/job`, `map/cache/post-2`). Values are opaque bytes; JSON helpers
//! are provided for structured state.

pub mod local;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStore;

/// Persisted key-value store contract.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a value, returning None when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value. Last write wins; no locking.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// List all keys starting with the given prefix.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Read a JSON value from the store.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn SettingsStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Write a JSON value to the store.
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn SettingsStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    store.set(key, &bytes).await
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let store = MemoryStore::new();
        store.set("a/b", b"hello").await.unwrap();

        assert_eq!(store.get("a/b").await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(store.get("a/c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_remove_and_keys() {
        let store = MemoryStore::new();
        store.set("map/cache/post-1", b"x").await.unwrap();
        store.set("map/cache/post-2", b"y").await.unwrap();
        store.set("audit/job", b"z").await.unwrap();

        let keys = store.keys("map/cache/").await.unwrap();
        assert_eq!(keys.len(), 2);

        store.remove("map/cache/post-1").await.unwrap();
        assert_eq!(store.keys("map/cache/").await.unwrap().len(), 1);

        // Removing a missing key is fine
        store.remove("map/cache/post-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryStore::new();
        let sample = Sample {
            name: "posts".into(),
            count: 3,
        };

        write_json(&store, "sample", &sample).await.unwrap();
        let loaded: Option<Sample> = read_json(&store, "sample").await.unwrap();
        assert_eq!(loaded, Some(sample));

        let missing: Option<Sample> = read_json(&store, "missing").await.unwrap();
        assert!(missing.is_none());
    }
}
