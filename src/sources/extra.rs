// src/sources/extra.rs

//! Map source for operator-added paths.
//!
//! Arbitrary URLs the operator wants listed even though no content record
//! backs them (landing pages, external tools under the same host, ...).
//! One source among equals: it owns its own kind and paginates like the
//! others.

use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use crate::error::Result;
use crate::models::{ExtraPath, IndexEntry, UrlEntry};
use crate::sources::{EXTRA_KIND, MapSource, page_count, page_slice};
use crate::utils::absolutize;

/// Serves the `extra` kind from the configured path list.
pub struct ExtraPathsSource {
    paths: Vec<ExtraPath>,
    per_page: u32,
    base: Url,
}

impl ExtraPathsSource {
    pub fn new(paths: Vec<ExtraPath>, per_page: u32, base: Url) -> Self {
        Self {
            paths,
            per_page,
            base,
        }
    }
}

#[async_trait]
impl MapSource for ExtraPathsSource {
    fn name(&self) -> &'static str {
        "extra-paths"
    }

    fn can_handle(&self, kind: &str) -> bool {
        kind == EXTRA_KIND
    }

    async fn index_summaries(&self) -> Result<Vec<IndexEntry>> {
        if self.paths.is_empty() {
            return Ok(Vec::new());
        }
        let lastmod = self
            .paths
            .iter()
            .filter_map(|p| p.updated)
            .max()
            .unwrap_or_else(Utc::now);
        Ok(vec![IndexEntry {
            kind: EXTRA_KIND.to_string(),
            pages: page_count(self.paths.len(), self.per_page),
            lastmod,
        }])
    }

    async fn entries(&self, kind: &str, page: u32) -> Result<Vec<UrlEntry>> {
        if !self.can_handle(kind) {
            return Ok(Vec::new());
        }
        let build_time = Utc::now();
        Ok(page_slice(&self.paths, page, self.per_page)
            .iter()
            .filter_map(|extra| match absolutize(&self.base, &extra.path) {
                Ok(loc) => Some(UrlEntry::new(loc, extra.updated.unwrap_or(build_time))),
                Err(e) => {
                    log::warn!("Skipping extra path {:?}: {}", extra.path, e);
                    None
                }
            })
            .collect())
    }
}
