// src/store/local.rs

//! Local filesystem settings store.
//!
//! One file per key under a root directory, mirroring the key's
//! slash-separated segments:
//!
//! ```text
//! {root}/
//! ├── meta/version          # last crate version that opened the store
//! ├── audit/job             # persisted audit job state (JSON)
//! └── map/cache/            # serialized partition bodies
//!     ├── post-1
//!     └── post-2
//! ```
//!
//! Writes go to a temp file first and are renamed into place, so readers
//! never observe a half-written value.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::store::SettingsStore;

const VERSION_KEY: &str = "meta/version";

/// Filesystem-backed settings store.
#[derive(Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at the given directory, recording the crate
    /// version. The previously recorded version is logged whenever it
    /// differs before being overwritten.
    pub async fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            root_dir: root_dir.into(),
        };

        let current = env!("CARGO_PKG_VERSION");
        let previous = store
            .get(VERSION_KEY)
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

        match previous {
            Some(prev) if prev == current => {}
            Some(prev) => {
                log::info!("Settings store last opened by version {}", prev);
                store.set(VERSION_KEY, current.as_bytes()).await?;
            }
            None => {
                store.set(VERSION_KEY, current.as_bytes()).await?;
            }
        }

        Ok(store)
    }

    /// Get the full path for a key.
    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.split('/').any(|seg| {
            seg.is_empty() || seg == "." || seg == ".." || seg.contains('\\')
        }) {
            return Err(AppError::store(format!("invalid key: {:?}", key)));
        }
        Ok(self.root_dir.join(key))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Collect relative key names under a directory, depth-first.
    async fn collect_keys(&self, dir: PathBuf, out: &mut Vec<String>) -> Result<()> {
        let mut pending = vec![dir];
        while let Some(current) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&current).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(AppError::Io(e)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if path.extension().is_none_or(|ext| ext != "tmp") {
                    if let Ok(rel) = path.strip_prefix(&self.root_dir) {
                        out.push(rel.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(value).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut out = Vec::new();
        self.collect_keys(self.root_dir.clone(), &mut out).await?;
        out.retain(|k| k.starts_with(prefix));
        out.sort();
        Ok(out)
    }
}
