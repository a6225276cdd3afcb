// src/audit/ignores.rs

//! Operator-suppressed issue identifiers.
//!
//! The local set is the source of truth. Every successful mutation ends
//! with a best-effort sync pushing the full set to the remote service so
//! its suppression list never silently drifts; a failed sync is logged and
//! never rolls the local change back.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::audit::remote::AuditApi;
use crate::error::Result;
use crate::hooks::AuditObserver;
use crate::store::{self, SettingsStore};

const IGNORES_KEY: &str = "audit/ignored";

static ID_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Whether a string is a well-formed issue identifier.
///
/// Letters (either case), digits, dashes and underscores only.
pub fn valid_id(id: &str) -> bool {
    let pattern =
        ID_PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static pattern"));
    pattern.is_match(id)
}

/// Persisted set of suppressed issue identifiers.
pub struct IgnoreRegistry {
    store: Arc<dyn SettingsStore>,
    api: Arc<dyn AuditApi>,
    observers: Vec<Arc<dyn AuditObserver>>,
}

impl IgnoreRegistry {
    pub fn new(store: Arc<dyn SettingsStore>, api: Arc<dyn AuditApi>) -> Self {
        Self {
            store,
            api,
            observers: Vec::new(),
        }
    }

    /// Register an observer notified after each successful sync.
    pub fn add_observer(&mut self, observer: Arc<dyn AuditObserver>) {
        self.observers.push(observer);
    }

    async fn load(&self) -> Result<BTreeSet<String>> {
        Ok(store::read_json(self.store.as_ref(), IGNORES_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save_and_sync(&self, ids: &BTreeSet<String>) -> Result<()> {
        store::write_json(self.store.as_ref(), IGNORES_KEY, ids).await?;

        let list: Vec<String> = ids.iter().cloned().collect();
        match self.api.sync_ignores(&list).await {
            Ok(()) => {
                for observer in &self.observers {
                    observer.ignores_synced(ids).await;
                }
            }
            Err(e) => log::warn!("Ignore sync failed (local state kept): {}", e),
        }
        Ok(())
    }

    /// Suppress an issue. Returns false for malformed identifiers, which
    /// change nothing.
    pub async fn set_ignore(&self, id: &str) -> Result<bool> {
        if !valid_id(id) {
            return Ok(false);
        }
        let mut ids = self.load().await?;
        if ids.insert(id.to_string()) {
            self.save_and_sync(&ids).await?;
        }
        Ok(true)
    }

    /// Unsuppress an issue. Returns false for malformed identifiers.
    pub async fn unset_ignore(&self, id: &str) -> Result<bool> {
        if !valid_id(id) {
            return Ok(false);
        }
        let mut ids = self.load().await?;
        if ids.remove(id) {
            self.save_and_sync(&ids).await?;
        }
        Ok(true)
    }

    /// Whether an issue is currently suppressed.
    pub async fn is_ignored(&self, id: &str) -> Result<bool> {
        if !valid_id(id) {
            return Ok(false);
        }
        Ok(self.load().await?.contains(id))
    }

    /// Drop every suppression.
    pub async fn clear(&self) -> Result<()> {
        let ids = self.load().await?;
        if ids.is_empty() {
            return Ok(());
        }
        self.save_and_sync(&BTreeSet::new()).await
    }

    /// The full current set.
    pub async fn all(&self) -> Result<BTreeSet<String>> {
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::audit::remote::{RemoteIssue, RemoteProgress, StartReply};
    use crate::error::AppError;
    use crate::store::MemoryStore;

    /// API double that records sync payloads and can be told to fail.
    #[derive(Default)]
    struct SyncApi {
        sync_calls: AtomicUsize,
        last_payload: tokio::sync::Mutex<Vec<String>>,
        fail_sync: bool,
    }

    #[async_trait]
    impl AuditApi for SyncApi {
        async fn start(&self) -> Result<StartReply> {
            Ok(StartReply::Queued)
        }
        async fn status(&self) -> Result<RemoteProgress> {
            Ok(RemoteProgress::default())
        }
        async fn result(&self) -> Result<Vec<RemoteIssue>> {
            Ok(Vec::new())
        }
        async fn sync_ignores(&self, ids: &[String]) -> Result<()> {
            self.sync_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_payload.lock().await = ids.to_vec();
            if self.fail_sync {
                return Err(AppError::remote("sync", "unreachable"));
            }
            Ok(())
        }
        async fn request_emails(&self) -> Result<()> {
            Ok(())
        }
    }

    fn registry(api: Arc<SyncApi>) -> IgnoreRegistry {
        IgnoreRegistry::new(Arc::new(MemoryStore::new()), api)
    }

    #[test]
    fn test_id_pattern() {
        assert!(valid_id("abc-123"));
        assert!(valid_id("ABC_x"));
        assert!(!valid_id("bad id!"));
        assert!(!valid_id(""));
        assert!(!valid_id("dots.not.allowed"));
    }

    #[tokio::test]
    async fn test_set_and_query() {
        let api = Arc::new(SyncApi::default());
        let registry = registry(Arc::clone(&api));

        assert!(registry.set_ignore("abc-123").await.unwrap());
        assert!(registry.is_ignored("abc-123").await.unwrap());
        assert!(!registry.is_ignored("other").await.unwrap());
        assert_eq!(api.sync_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*api.last_payload.lock().await, vec!["abc-123".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_id_rejected_without_mutation() {
        let api = Arc::new(SyncApi::default());
        let registry = registry(Arc::clone(&api));

        assert!(!registry.set_ignore("bad id!").await.unwrap());
        assert!(!registry.is_ignored("bad id!").await.unwrap());
        assert!(registry.all().await.unwrap().is_empty());
        assert_eq!(api.sync_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_set_skips_sync() {
        let api = Arc::new(SyncApi::default());
        let registry = registry(Arc::clone(&api));

        registry.set_ignore("abc").await.unwrap();
        registry.set_ignore("abc").await.unwrap();
        assert_eq!(api.sync_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unset_and_clear() {
        let api = Arc::new(SyncApi::default());
        let registry = registry(Arc::clone(&api));

        registry.set_ignore("one").await.unwrap();
        registry.set_ignore("two").await.unwrap();

        assert!(registry.unset_ignore("one").await.unwrap());
        assert!(!registry.is_ignored("one").await.unwrap());

        registry.clear().await.unwrap();
        assert!(registry.all().await.unwrap().is_empty());
        assert!(*api.last_payload.lock().await == Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_sync_failure_keeps_local_state() {
        let api = Arc::new(SyncApi {
            fail_sync: true,
            ..SyncApi::default()
        });
        let registry = registry(Arc::clone(&api));

        assert!(registry.set_ignore("kept-locally").await.unwrap());
        assert!(registry.is_ignored("kept-locally").await.unwrap());
    }
}
