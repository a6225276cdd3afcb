// src/sources/groups.rs

//! Map source for community group pages.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::content::ContentRepository;
use crate::error::Result;
use crate::models::{IndexEntry, UrlEntry};
use crate::sources::{GROUPS_KIND, MapSource, page_count, page_slice};
use crate::utils::absolutize;

/// Serves the `group` kind when the groups feature is enabled.
pub struct GroupsSource {
    repo: Arc<dyn ContentRepository>,
    per_page: u32,
    base: Url,
}

impl GroupsSource {
    pub fn new(repo: Arc<dyn ContentRepository>, per_page: u32, base: Url) -> Self {
        Self {
            repo,
            per_page,
            base,
        }
    }
}

#[async_trait]
impl MapSource for GroupsSource {
    fn name(&self) -> &'static str {
        "groups"
    }

    fn can_handle(&self, kind: &str) -> bool {
        kind == GROUPS_KIND
    }

    async fn index_summaries(&self) -> Result<Vec<IndexEntry>> {
        let groups = self.repo.groups().await?;
        let Some(lastmod) = groups.iter().map(|r| r.modified_at).max() else {
            return Ok(Vec::new());
        };
        Ok(vec![IndexEntry {
            kind: GROUPS_KIND.to_string(),
            pages: page_count(groups.len(), self.per_page),
            lastmod,
        }])
    }

    async fn entries(&self, kind: &str, page: u32) -> Result<Vec<UrlEntry>> {
        if !self.can_handle(kind) {
            return Ok(Vec::new());
        }
        let groups = self.repo.groups().await?;
        Ok(page_slice(&groups, page, self.per_page)
            .iter()
            .filter_map(|record| match absolutize(&self.base, &record.permalink) {
                Ok(loc) => Some(UrlEntry::new(loc, record.modified_at)),
                Err(e) => {
                    log::warn!("Skipping group {}: bad permalink: {}", record.id, e);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentSet, StaticRepository};
    use crate::models::GroupRecord;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_groups_listed() {
        let mut set = ContentSet::default();
        set.groups = vec![GroupRecord {
            id: 1,
            permalink: "/groups/hikers".into(),
            modified_at: Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
        }];
        let source = GroupsSource::new(
            Arc::new(StaticRepository::new(set)),
            10,
            Url::parse("https://example.com/").unwrap(),
        );

        let summaries = source.index_summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].kind, "group");

        let entries = source.entries("group", 1).await.unwrap();
        assert_eq!(entries[0].loc, "https://example.com/groups/hikers");
    }

    #[tokio::test]
    async fn test_no_groups_means_no_summary() {
        let source = GroupsSource::new(
            Arc::new(StaticRepository::default()),
            10,
            Url::parse("https://example.com/").unwrap(),
        );
        assert!(source.index_summaries().await.unwrap().is_empty());
    }
}
