// src/sources/terms.rs

//! Map source for taxonomy terms.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::content::ContentRepository;
use crate::error::Result;
use crate::models::{IndexEntry, TermRecord, UrlEntry};
use crate::sources::{MapSource, page_count, page_slice};
use crate::utils::absolutize;

/// Serves the taxonomies configured under `map.taxonomies`.
pub struct TermsSource {
    repo: Arc<dyn ContentRepository>,
    taxonomies: Vec<String>,
    per_page: u32,
    base: Url,
}

impl TermsSource {
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        taxonomies: Vec<String>,
        per_page: u32,
        base: Url,
    ) -> Self {
        Self {
            repo,
            taxonomies,
            per_page,
            base,
        }
    }

    fn to_entry(&self, record: &TermRecord) -> Option<UrlEntry> {
        match absolutize(&self.base, &record.permalink) {
            Ok(loc) => Some(UrlEntry::new(loc, record.modified_at)),
            Err(e) => {
                log::warn!("Skipping term {}: bad permalink: {}", record.id, e);
                None
            }
        }
    }
}

#[async_trait]
impl MapSource for TermsSource {
    fn name(&self) -> &'static str {
        "terms"
    }

    fn can_handle(&self, kind: &str) -> bool {
        self.taxonomies.iter().any(|t| t == kind)
    }

    async fn index_summaries(&self) -> Result<Vec<IndexEntry>> {
        let mut summaries = Vec::new();
        for taxonomy in &self.taxonomies {
            let terms = self.repo.terms(taxonomy).await?;
            let Some(lastmod) = terms.iter().map(|r| r.modified_at).max() else {
                continue;
            };
            summaries.push(IndexEntry {
                kind: taxonomy.clone(),
                pages: page_count(terms.len(), self.per_page),
                lastmod,
            });
        }
        Ok(summaries)
    }

    async fn entries(&self, kind: &str, page: u32) -> Result<Vec<UrlEntry>> {
        if !self.can_handle(kind) {
            return Ok(Vec::new());
        }
        let terms = self.repo.terms(kind).await?;
        Ok(page_slice(&terms, page, self.per_page)
            .iter()
            .filter_map(|record| self.to_entry(record))
            .collect())
    }
}
