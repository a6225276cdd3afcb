// src/sources/profiles.rs

//! Map source for member profile pages.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::content::ContentRepository;
use crate::error::Result;
use crate::models::{IndexEntry, UrlEntry};
use crate::sources::{MapSource, PROFILES_KIND, page_count, page_slice};
use crate::utils::absolutize;

/// Serves the `profile` kind when the profiles feature is enabled.
pub struct ProfilesSource {
    repo: Arc<dyn ContentRepository>,
    per_page: u32,
    base: Url,
}

impl ProfilesSource {
    pub fn new(repo: Arc<dyn ContentRepository>, per_page: u32, base: Url) -> Self {
        Self {
            repo,
            per_page,
            base,
        }
    }
}

#[async_trait]
impl MapSource for ProfilesSource {
    fn name(&self) -> &'static str {
        "profiles"
    }

    fn can_handle(&self, kind: &str) -> bool {
        kind == PROFILES_KIND
    }

    async fn index_summaries(&self) -> Result<Vec<IndexEntry>> {
        let profiles = self.repo.profiles().await?;
        let Some(lastmod) = profiles.iter().map(|r| r.modified_at).max() else {
            return Ok(Vec::new());
        };
        Ok(vec![IndexEntry {
            kind: PROFILES_KIND.to_string(),
            pages: page_count(profiles.len(), self.per_page),
            lastmod,
        }])
    }

    async fn entries(&self, kind: &str, page: u32) -> Result<Vec<UrlEntry>> {
        if !self.can_handle(kind) {
            return Ok(Vec::new());
        }
        let profiles = self.repo.profiles().await?;
        Ok(page_slice(&profiles, page, self.per_page)
            .iter()
            .filter_map(|record| match absolutize(&self.base, &record.permalink) {
                Ok(loc) => Some(UrlEntry::new(loc, record.modified_at)),
                Err(e) => {
                    log::warn!("Skipping profile {}: bad permalink: {}", record.id, e);
                    None
                }
            })
            .collect())
    }
}
