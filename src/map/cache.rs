// src/map/cache.rs

//! Per-partition output cache.
//!
//! Serialized bodies are stored uncompressed under keys namespaced by kind
//! and page. Entries have no TTL; they live until a content change or audit
//! completion invalidates the whole cache. Concurrent writers for the same
//! key race with last-write-wins, which is acceptable because regenerating
//! a partition is deterministic and cheap.

use std::sync::Arc;

use crate::error::Result;
use crate::store::SettingsStore;

const CACHE_PREFIX: &str = "map/cache/";

/// Keyed store for serialized partition bodies.
#[derive(Clone)]
pub struct MapCache {
    store: Arc<dyn SettingsStore>,
}

impl MapCache {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    fn key(kind: &str, page: u32) -> String {
        format!("{}{}-{}", CACHE_PREFIX, kind, page)
    }

    /// Look up the cached body for a partition.
    pub async fn get(&self, kind: &str, page: u32) -> Result<Option<Vec<u8>>> {
        self.store.get(&Self::key(kind, page)).await
    }

    /// Store the body for a partition.
    pub async fn set(&self, kind: &str, page: u32, body: &[u8]) -> Result<()> {
        self.store.set(&Self::key(kind, page), body).await
    }

    /// Drop every cached partition. Returns the number of entries removed.
    pub async fn invalidate_all(&self) -> Result<usize> {
        let keys = self.store.keys(CACHE_PREFIX).await?;
        let count = keys.len();
        for key in keys {
            self.store.remove(&key).await?;
        }
        if count > 0 {
            log::info!("Invalidated {} cached map partitions", count);
        }
        Ok(count)
    }

    /// Keys of all cached partitions, for diagnostics.
    pub async fn cached_keys(&self) -> Result<Vec<String>> {
        self.store.keys(CACHE_PREFIX).await
    }
}
