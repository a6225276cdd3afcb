// src/hooks.rs

//! Extension interfaces.
//!
//! External behavior is attached through ordered registries of trait
//! objects rather than ambient hook dispatch: the engine and the audit
//! coordinator call every registered extension in registration order.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::map::MapCache;
use crate::models::{AuditResult, AuditTrigger, IndexEntry, UrlEntry};

/// Extension point for the map engine.
#[async_trait]
pub trait MapExtension: Send + Sync {
    /// Transform the entry list of a partition before serialization.
    fn augment_entries(&self, _kind: &str, entries: Vec<UrlEntry>) -> Vec<UrlEntry> {
        entries
    }

    /// Transform the summary list before the index is serialized.
    fn augment_index(&self, summaries: Vec<IndexEntry>) -> Vec<IndexEntry> {
        summaries
    }

    /// Called after a fresh index build with the total partition count.
    /// Search-engine notification lives here.
    async fn map_rebuilt(&self, _partitions: u32) {}
}

/// Observer of audit lifecycle events.
#[async_trait]
pub trait AuditObserver: Send + Sync {
    /// Called exactly once per completed (or timed-out) audit run.
    async fn audit_done(&self, _result: &AuditResult, _trigger: AuditTrigger) {}

    /// Called after the ignore set was synchronized to the remote service.
    async fn ignores_synced(&self, _ids: &BTreeSet<String>) {}
}

/// Observer that drops every cached partition when an audit finishes, so
/// the next map request regenerates from fresh content.
pub struct CacheInvalidator {
    cache: MapCache,
}

impl CacheInvalidator {
    pub fn new(cache: MapCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl AuditObserver for CacheInvalidator {
    async fn audit_done(&self, _result: &AuditResult, trigger: AuditTrigger) {
        if let Err(e) = self.cache.invalidate_all().await {
            log::warn!("Cache invalidation after audit ({:?}) failed: {}", trigger, e);
        }
    }
}
