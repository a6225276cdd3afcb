// src/content/mod.rs

//! Read-only content repository contract.
//!
//! The repository is an external collaborator; map sources only query it.
//! Results are returned in full and ordered by ascending id so that page
//! slicing is deterministic across calls. A disabled or empty source is an
//! empty list, never an error; errors are reserved for storage failures.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{ContentRecord, GroupRecord, ProfileRecord, TermRecord};

/// Read-only query interface over the site's content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// All items of one content kind, ordered by ascending id.
    async fn items(&self, kind: &str) -> Result<Vec<ContentRecord>>;

    /// All terms of one taxonomy, ordered by ascending id.
    async fn terms(&self, taxonomy: &str) -> Result<Vec<TermRecord>>;

    /// All community groups, ordered by ascending id.
    async fn groups(&self) -> Result<Vec<GroupRecord>>;

    /// All member profiles, ordered by ascending id.
    async fn profiles(&self) -> Result<Vec<ProfileRecord>>;
}

/// Serialized fixture shape for [`StaticRepository`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSet {
    /// Items keyed by content kind
    #[serde(default)]
    pub items: BTreeMap<String, Vec<ContentRecord>>,

    /// Terms keyed by taxonomy
    #[serde(default)]
    pub terms: BTreeMap<String, Vec<TermRecord>>,

    #[serde(default)]
    pub groups: Vec<GroupRecord>,

    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,
}

/// Repository over a fixed, in-memory content set.
///
/// Used by the CLI (loaded from `content.json`) and throughout the tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRepository {
    data: ContentSet,
}

impl StaticRepository {
    /// Build a repository over the given content set, sorting every list
    /// by id so pagination stays deterministic regardless of input order.
    pub fn new(mut data: ContentSet) -> Self {
        for items in data.items.values_mut() {
            items.sort_by_key(|r| r.id);
        }
        for terms in data.terms.values_mut() {
            terms.sort_by_key(|r| r.id);
        }
        data.groups.sort_by_key(|r| r.id);
        data.profiles.sort_by_key(|r| r.id);
        Self { data }
    }

    /// Load a content set from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl ContentRepository for StaticRepository {
    async fn items(&self, kind: &str) -> Result<Vec<ContentRecord>> {
        Ok(self.data.items.get(kind).cloned().unwrap_or_default())
    }

    async fn terms(&self, taxonomy: &str) -> Result<Vec<TermRecord>> {
        Ok(self.data.terms.get(taxonomy).cloned().unwrap_or_default())
    }

    async fn groups(&self) -> Result<Vec<GroupRecord>> {
        Ok(self.data.groups.clone())
    }

    async fn profiles(&self) -> Result<Vec<ProfileRecord>> {
        Ok(self.data.profiles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_static_repository_sorts_by_id() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut set = ContentSet::default();
        set.items.insert(
            "post".to_string(),
            vec![
                ContentRecord {
                    id: 7,
                    permalink: "/post-7".into(),
                    modified_at: ts,
                    images: Vec::new(),
                },
                ContentRecord {
                    id: 2,
                    permalink: "/post-2".into(),
                    modified_at: ts,
                    images: Vec::new(),
                },
            ],
        );

        let repo = StaticRepository::new(set);
        let items = repo.items("post").await.unwrap();
        assert_eq!(items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 7]);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_empty() {
        let repo = StaticRepository::default();
        assert!(repo.items("movie").await.unwrap().is_empty());
        assert!(repo.terms("genre").await.unwrap().is_empty());
        assert!(repo.groups().await.unwrap().is_empty());
    }
}
