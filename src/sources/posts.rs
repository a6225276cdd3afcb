// src/sources/posts.rs

//! Map source for ordinary content items.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::content::ContentRepository;
use crate::error::Result;
use crate::models::{ContentRecord, ImageRef, IndexEntry, UrlEntry};
use crate::sources::{MapSource, page_count, page_slice};
use crate::utils::absolutize;

/// Serves the content kinds configured under `map.content_kinds`.
pub struct PostsSource {
    repo: Arc<dyn ContentRepository>,
    kinds: Vec<String>,
    per_page: u32,
    base: Url,
}

impl PostsSource {
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        kinds: Vec<String>,
        per_page: u32,
        base: Url,
    ) -> Self {
        Self {
            repo,
            kinds,
            per_page,
            base,
        }
    }

    fn to_entry(&self, record: &ContentRecord) -> Option<UrlEntry> {
        let loc = match absolutize(&self.base, &record.permalink) {
            Ok(loc) => loc,
            Err(e) => {
                log::warn!("Skipping item {}: bad permalink: {}", record.id, e);
                return None;
            }
        };

        let images = record
            .images
            .iter()
            .filter_map(|img| match absolutize(&self.base, &img.src) {
                Ok(src) => Some(ImageRef {
                    src,
                    title: img.title.clone(),
                }),
                Err(e) => {
                    log::warn!("Skipping image on item {}: {}", record.id, e);
                    None
                }
            })
            .collect();

        Some(UrlEntry {
            loc,
            lastmod: record.modified_at,
            images,
        })
    }
}

#[async_trait]
impl MapSource for PostsSource {
    fn name(&self) -> &'static str {
        "posts"
    }

    fn can_handle(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    async fn index_summaries(&self) -> Result<Vec<IndexEntry>> {
        let mut summaries = Vec::new();
        for kind in &self.kinds {
            let items = self.repo.items(kind).await?;
            let Some(lastmod) = items.iter().map(|r| r.modified_at).max() else {
                continue;
            };
            summaries.push(IndexEntry {
                kind: kind.clone(),
                pages: page_count(items.len(), self.per_page),
                lastmod,
            });
        }
        Ok(summaries)
    }

    async fn entries(&self, kind: &str, page: u32) -> Result<Vec<UrlEntry>> {
        if !self.can_handle(kind) {
            return Ok(Vec::new());
        }
        let items = self.repo.items(kind).await?;
        Ok(page_slice(&items, page, self.per_page)
            .iter()
            .filter_map(|record| self.to_entry(record))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentSet, StaticRepository};
    use chrono::{TimeZone, Utc};

    fn repo_with_posts(count: u64) -> Arc<StaticRepository> {
        let mut set = ContentSet::default();
        set.items.insert(
            "post".to_string(),
            (1..=count)
                .map(|id| ContentRecord {
                    id,
                    permalink: format!("/post-{}", id),
                    modified_at: Utc.with_ymd_and_hms(2026, 1, id as u32, 0, 0, 0).unwrap(),
                    images: Vec::new(),
                })
                .collect(),
        );
        Arc::new(StaticRepository::new(set))
    }

    fn source(repo: Arc<StaticRepository>, per_page: u32) -> PostsSource {
        PostsSource::new(
            repo,
            vec!["post".to_string(), "page".to_string()],
            per_page,
            Url::parse("https://example.com/").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_summaries_report_page_counts() {
        let source = source(repo_with_posts(3), 2);
        let summaries = source.index_summaries().await.unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].kind, "post");
        assert_eq!(summaries[0].pages, 2);
        assert_eq!(
            summaries[0].lastmod,
            Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_kind_omitted_from_summaries() {
        let source = source(repo_with_posts(0), 2);
        assert!(source.index_summaries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pagination_is_complete_and_disjoint() {
        let source = source(repo_with_posts(5), 2);

        let mut locs = Vec::new();
        for page in 1..=3 {
            for entry in source.entries("post", page).await.unwrap() {
                locs.push(entry.loc);
            }
        }

        let expected: Vec<String> = (1..=5)
            .map(|id| format!("https://example.com/post-{}", id))
            .collect();
        assert_eq!(locs, expected);
    }

    #[tokio::test]
    async fn test_unowned_kind_is_empty() {
        let source = source(repo_with_posts(3), 2);
        assert!(source.entries("category", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_images_carried_through() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let mut set = ContentSet::default();
        set.items.insert(
            "post".to_string(),
            vec![ContentRecord {
                id: 1,
                permalink: "/hello".into(),
                modified_at: ts,
                images: vec![crate::models::ImageRecord {
                    src: "/img/cover.png".into(),
                    title: "Cover".into(),
                }],
            }],
        );
        let source = source(Arc::new(StaticRepository::new(set)), 10);

        let entries = source.entries("post", 1).await.unwrap();
        assert_eq!(entries[0].images.len(), 1);
        assert_eq!(entries[0].images[0].src, "https://example.com/img/cover.png");
    }
}
