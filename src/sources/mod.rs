// src/sources/mod.rs

//! Map sources.
//!
//! Each source produces map entries from one family of content (ordinary
//! items, taxonomy terms, groups, profiles, operator-added paths). The
//! engine iterates the source list until one claims the requested kind;
//! every kind must be claimed by exactly one source.

mod extra;
mod groups;
mod posts;
mod profiles;
mod terms;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::content::ContentRepository;
use crate::error::{AppError, Result};
use crate::models::{Config, IndexEntry, UrlEntry};

pub use extra::ExtraPathsSource;
pub use groups::GroupsSource;
pub use posts::PostsSource;
pub use profiles::ProfilesSource;
pub use terms::TermsSource;

/// Kind owned by the groups source.
pub const GROUPS_KIND: &str = "group";
/// Kind owned by the profiles source.
pub const PROFILES_KIND: &str = "profile";
/// Kind owned by the extra-paths source.
pub const EXTRA_KIND: &str = "extra";

/// Producer of map entries for one family of content.
#[async_trait]
pub trait MapSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this source owns the given partition kind.
    fn can_handle(&self, kind: &str) -> bool;

    /// One summary per owned kind that has content. A source with nothing
    /// to enumerate returns an empty list.
    async fn index_summaries(&self) -> Result<Vec<IndexEntry>>;

    /// Entries for one page of one owned kind. Ordering is stable across
    /// calls so pagination never skips or duplicates items.
    async fn entries(&self, kind: &str, page: u32) -> Result<Vec<UrlEntry>>;
}

/// Number of pages needed for `total` items at `per_page` items each.
pub fn page_count(total: usize, per_page: u32) -> u32 {
    (total as u64).div_ceil(per_page.max(1) as u64).max(1) as u32
}

/// The slice of `items` belonging to 1-based `page`.
pub fn page_slice<T>(items: &[T], page: u32, per_page: u32) -> &[T] {
    let per_page = per_page.max(1) as usize;
    let start = (page.max(1) as usize - 1) * per_page;
    if start >= items.len() {
        return &[];
    }
    let end = (start + per_page).min(items.len());
    &items[start..end]
}

/// Assemble the source list described by the configuration.
///
/// Fails when two sources would claim the same kind, which would make
/// partition ownership ambiguous.
pub fn assemble(config: &Config, repo: Arc<dyn ContentRepository>) -> Result<Vec<Arc<dyn MapSource>>> {
    let base = config.site.base_url()?;
    let per_page = config.map.per_page;

    let mut sources: Vec<Arc<dyn MapSource>> = vec![
        Arc::new(PostsSource::new(
            Arc::clone(&repo),
            config.map.content_kinds.clone(),
            per_page,
            base.clone(),
        )),
        Arc::new(TermsSource::new(
            Arc::clone(&repo),
            config.map.taxonomies.clone(),
            per_page,
            base.clone(),
        )),
    ];

    if config.map.groups_enabled {
        sources.push(Arc::new(GroupsSource::new(
            Arc::clone(&repo),
            per_page,
            base.clone(),
        )));
    }
    if config.map.profiles_enabled {
        sources.push(Arc::new(ProfilesSource::new(repo, per_page, base.clone())));
    }
    if !config.map.extra_paths.is_empty() {
        sources.push(Arc::new(ExtraPathsSource::new(
            config.map.extra_paths.clone(),
            per_page,
            base,
        )));
    }

    let mut seen = BTreeSet::new();
    let mut all_kinds: Vec<&str> = Vec::new();
    all_kinds.extend(config.map.content_kinds.iter().map(String::as_str));
    all_kinds.extend(config.map.taxonomies.iter().map(String::as_str));
    all_kinds.extend([GROUPS_KIND, PROFILES_KIND, EXTRA_KIND]);
    for kind in all_kinds {
        if !seen.insert(kind) {
            return Err(AppError::validation(format!(
                "kind '{}' is claimed by more than one source",
                kind
            )));
        }
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 2), 1);
        assert_eq!(page_count(1, 2), 1);
        assert_eq!(page_count(2, 2), 1);
        assert_eq!(page_count(3, 2), 2);
        assert_eq!(page_count(1000, 1000), 1);
        assert_eq!(page_count(1001, 1000), 2);
    }

    #[test]
    fn test_page_slice_covers_all_items_once() {
        let items: Vec<u32> = (1..=5).collect();
        let mut seen = Vec::new();
        for page in 1..=page_count(items.len(), 2) {
            seen.extend_from_slice(page_slice(&items, page, 2));
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn test_page_slice_past_end_is_empty() {
        let items: Vec<u32> = (1..=3).collect();
        assert!(page_slice(&items, 3, 2).is_empty());
    }

    #[test]
    fn test_assemble_rejects_overlapping_kinds() {
        let mut config = Config::default();
        config.map.taxonomies = vec!["post".to_string()];
        let repo = Arc::new(crate::content::StaticRepository::default());
        assert!(assemble(&config, repo).is_err());
    }

    #[test]
    fn test_assemble_default_sources() {
        let config = Config::default();
        let repo = Arc::new(crate::content::StaticRepository::default());
        let sources = assemble(&config, repo).unwrap();

        // groups/profiles disabled, no extra paths
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().any(|s| s.can_handle("post")));
        assert!(sources.iter().any(|s| s.can_handle("category")));
        assert!(!sources.iter().any(|s| s.can_handle(GROUPS_KIND)));
    }

    #[test]
    fn test_each_kind_claimed_by_exactly_one_source() {
        let mut config = Config::default();
        config.map.groups_enabled = true;
        config.map.profiles_enabled = true;
        config.map.extra_paths = vec![crate::models::ExtraPath {
            path: "/landing".to_string(),
            updated: None,
        }];
        let repo = Arc::new(crate::content::StaticRepository::default());
        let sources = assemble(&config, repo).unwrap();

        for kind in ["post", "page", "category", "tag", "group", "profile", "extra"] {
            let owners = sources.iter().filter(|s| s.can_handle(kind)).count();
            assert_eq!(owners, 1, "kind {} owned by {} sources", kind, owners);
        }
    }
}
