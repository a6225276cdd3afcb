// src/map/engine.rs

//! Content map engine.
//!
//! Classifies a map request as the index or one partition, serves from the
//! cache when possible, and otherwise builds the document from the source
//! registry. When the host environment ships its own map generator and the
//! operator has not overridden it, requests are redirected there instead.

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use flate2::{Compression, write::GzEncoder};
use url::Url;

use crate::error::Result;
use crate::hooks::MapExtension;
use crate::map::{MapCache, render};
use crate::models::{Config, IndexEntry, UrlEntry};
use crate::sources::MapSource;

/// Kind name reserved for the index document.
pub const INDEX_KIND: &str = "index";

/// A classified map request.
#[derive(Debug, Clone, Default)]
pub struct MapQuery {
    /// Whether the request addressed the map at all
    pub sitemap: bool,

    /// Requested kind; absent or "index" selects the index document
    pub kind: Option<String>,

    /// Requested page; 0 or absent means page 1
    pub page: u32,

    /// Whether the response body should be gzip-compressed
    pub gzip: bool,
}

impl MapQuery {
    /// Request for the index document.
    pub fn index() -> Self {
        Self {
            sitemap: true,
            ..Self::default()
        }
    }

    /// Request for one partition page.
    pub fn partition(kind: impl Into<String>, page: u32) -> Self {
        Self {
            sitemap: true,
            kind: Some(kind.into()),
            page,
            ..Self::default()
        }
    }

    /// Ask for a gzip-compressed body.
    pub fn gzipped(mut self) -> Self {
        self.gzip = true;
        self
    }
}

/// Outcome of handling a map request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOutcome {
    /// A serialized map document
    Document { body: Vec<u8>, gzipped: bool },

    /// Unknown kind, or a partition with nothing in it
    NotFound,

    /// The host's native generator should answer instead
    Redirect(String),
}

enum Target {
    Index,
    Partition { kind: String, page: u32 },
}

/// Orchestrates sources, cache and rendering.
pub struct MapEngine {
    sources: Vec<Arc<dyn MapSource>>,
    cache: MapCache,
    extensions: Vec<Arc<dyn MapExtension>>,
    base: Url,
    root_kinds: Vec<String>,
    native_map_url: Option<String>,
    override_native: bool,
}

impl MapEngine {
    pub fn new(
        config: &Config,
        sources: Vec<Arc<dyn MapSource>>,
        cache: MapCache,
    ) -> Result<Self> {
        Ok(Self {
            sources,
            cache,
            extensions: Vec::new(),
            base: config.site.base_url()?,
            root_kinds: config.map.root_kinds.clone(),
            native_map_url: config.site.native_map_url.clone(),
            override_native: config.map.override_native,
        })
    }

    /// Register an extension. Extensions run in registration order.
    pub fn add_extension(&mut self, extension: Arc<dyn MapExtension>) {
        self.extensions.push(extension);
    }

    /// Access to the partition cache, e.g. for wiring invalidation.
    pub fn cache(&self) -> &MapCache {
        &self.cache
    }

    /// Handle one map request.
    pub async fn handle(&self, query: &MapQuery) -> Result<MapOutcome> {
        if !query.sitemap {
            return Ok(MapOutcome::NotFound);
        }

        if let Some(native) = &self.native_map_url {
            if !self.override_native {
                return Ok(MapOutcome::Redirect(native.clone()));
            }
        }

        let target = self.classify(query);
        let (kind, page) = match &target {
            Target::Index => (INDEX_KIND, 1),
            Target::Partition { kind, page } => (kind.as_str(), *page),
        };

        if let Some(body) = self.cache.get(kind, page).await? {
            return Self::deliver(body, query.gzip);
        }

        let body = match &target {
            Target::Index => Some(self.build_index().await?),
            Target::Partition { kind, page } => self.build_partition(kind, *page).await?,
        };

        match body {
            Some(body) => {
                self.cache.set(kind, page, &body).await?;
                Self::deliver(body, query.gzip)
            }
            None => Ok(MapOutcome::NotFound),
        }
    }

    /// The augmented partition summaries, without touching the cache.
    pub async fn partitions(&self) -> Result<Vec<IndexEntry>> {
        self.collect_summaries().await
    }

    fn classify(&self, query: &MapQuery) -> Target {
        match query.kind.as_deref() {
            None | Some(INDEX_KIND) | Some("") => Target::Index,
            Some(kind) => Target::Partition {
                kind: kind.to_string(),
                page: query.page.max(1),
            },
        }
    }

    async fn collect_summaries(&self) -> Result<Vec<IndexEntry>> {
        let lists = futures::future::try_join_all(
            self.sources.iter().map(|source| source.index_summaries()),
        )
        .await?;

        let mut summaries: Vec<IndexEntry> = lists.into_iter().flatten().collect();
        for extension in &self.extensions {
            summaries = extension.augment_index(summaries);
        }
        Ok(summaries)
    }

    async fn build_index(&self) -> Result<Vec<u8>> {
        let summaries = self.collect_summaries().await?;
        let partitions: u32 = summaries.iter().map(|s| s.pages).sum();
        let body = render::render_index(&self.base, &summaries).into_bytes();

        log::info!("Content map index rebuilt with {} partitions", partitions);
        for extension in &self.extensions {
            extension.map_rebuilt(partitions).await;
        }

        Ok(body)
    }

    async fn build_partition(&self, kind: &str, page: u32) -> Result<Option<Vec<u8>>> {
        let Some(source) = self.sources.iter().find(|s| s.can_handle(kind)) else {
            log::info!("No source claims map kind {:?}", kind);
            return Ok(None);
        };

        let mut entries = source.entries(kind, page).await?;

        // The root-page kinds lead with the homepage on their first page.
        if page == 1 && self.root_kinds.iter().any(|k| k == kind) {
            let lastmod = entries
                .iter()
                .map(|e| e.lastmod)
                .max()
                .unwrap_or_else(Utc::now);
            entries.insert(0, UrlEntry::new(self.base.to_string(), lastmod));
        }

        for extension in &self.extensions {
            entries = extension.augment_entries(kind, entries);
        }
        entries.retain(UrlEntry::has_location);

        if entries.is_empty() {
            log::info!("Map kind {:?} page {} has no entries", kind, page);
            return Ok(None);
        }

        log::debug!(
            "Built partition {}-{} from source {} with {} entries",
            kind,
            page,
            source.name(),
            entries.len()
        );
        Ok(Some(render::render_partition(&entries).into_bytes()))
    }

    fn deliver(body: Vec<u8>, gzip: bool) -> Result<MapOutcome> {
        if !gzip {
            return Ok(MapOutcome::Document {
                body,
                gzipped: false,
            });
        }
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        Ok(MapOutcome::Document {
            body: encoder.finish()?,
            gzipped: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::content::{ContentRepository, ContentSet, StaticRepository};
    use crate::models::{ContentRecord, GroupRecord, ProfileRecord, TermRecord};
    use crate::store::MemoryStore;

    /// Repository wrapper that counts item queries.
    struct CountingRepo {
        inner: StaticRepository,
        item_queries: AtomicUsize,
    }

    #[async_trait]
    impl ContentRepository for CountingRepo {
        async fn items(&self, kind: &str) -> crate::error::Result<Vec<ContentRecord>> {
            self.item_queries.fetch_add(1, Ordering::SeqCst);
            self.inner.items(kind).await
        }
        async fn terms(&self, taxonomy: &str) -> crate::error::Result<Vec<TermRecord>> {
            self.inner.terms(taxonomy).await
        }
        async fn groups(&self) -> crate::error::Result<Vec<GroupRecord>> {
            self.inner.groups().await
        }
        async fn profiles(&self) -> crate::error::Result<Vec<ProfileRecord>> {
            self.inner.profiles().await
        }
    }

    fn content_with_posts(count: u64) -> ContentSet {
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
        set
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.map.per_page = 2;
        // Only "page" carries the synthesized homepage in these tests.
        config.map.root_kinds = vec!["page".to_string()];
        config
    }

    fn engine_over(repo: Arc<dyn ContentRepository>, config: &Config) -> MapEngine {
        let sources = crate::sources::assemble(config, repo).unwrap();
        let cache = MapCache::new(Arc::new(MemoryStore::new()));
        MapEngine::new(config, sources, cache).unwrap()
    }

    fn body_of(outcome: MapOutcome) -> String {
        match outcome {
            MapOutcome::Document { body, gzipped } => {
                assert!(!gzipped);
                String::from_utf8(body).unwrap()
            }
            other => panic!("expected document, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_three_items_two_pages() {
        let config = test_config();
        let repo = Arc::new(StaticRepository::new(content_with_posts(3)));
        let engine = engine_over(repo, &config);

        let index = body_of(engine.handle(&MapQuery::index()).await.unwrap());
        assert!(index.contains("sitemap_type=post&amp;sitemap_page=2"));

        let page1 = body_of(engine.handle(&MapQuery::partition("post", 1)).await.unwrap());
        assert_eq!(page1.matches("<url>").count(), 2);
        assert!(page1.contains("https://example.com/post-1"));
        assert!(page1.contains("https://example.com/post-2"));

        let page2 = body_of(engine.handle(&MapQuery::partition("post", 2)).await.unwrap());
        assert_eq!(page2.matches("<url>").count(), 1);
        assert!(page2.contains("https://example.com/post-3"));
    }

    #[tokio::test]
    async fn test_cache_idempotence_skips_sources() {
        let config = test_config();
        let repo = Arc::new(CountingRepo {
            inner: StaticRepository::new(content_with_posts(3)),
            item_queries: AtomicUsize::new(0),
        });
        let counter = Arc::clone(&repo);
        let engine = engine_over(repo, &config);

        let first = body_of(engine.handle(&MapQuery::partition("post", 1)).await.unwrap());
        let queries_after_first = counter.item_queries.load(Ordering::SeqCst);

        let second = body_of(engine.handle(&MapQuery::partition("post", 1)).await.unwrap());
        assert_eq!(first, second);
        assert_eq!(counter.item_queries.load(Ordering::SeqCst), queries_after_first);
    }

    #[tokio::test]
    async fn test_invalidation_rebuilds() {
        let config = test_config();
        let repo = Arc::new(CountingRepo {
            inner: StaticRepository::new(content_with_posts(1)),
            item_queries: AtomicUsize::new(0),
        });
        let counter = Arc::clone(&repo);
        let engine = engine_over(repo, &config);

        engine.handle(&MapQuery::partition("post", 1)).await.unwrap();
        engine.cache().invalidate_all().await.unwrap();
        engine.handle(&MapQuery::partition("post", 1)).await.unwrap();

        assert_eq!(counter.item_queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_not_found() {
        let config = test_config();
        let repo = Arc::new(StaticRepository::new(content_with_posts(1)));
        let engine = engine_over(repo, &config);

        let outcome = engine.handle(&MapQuery::partition("movie", 1)).await.unwrap();
        assert_eq!(outcome, MapOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_known_kind_without_entries_is_not_found() {
        let config = test_config();
        let repo = Arc::new(StaticRepository::new(content_with_posts(0)));
        let engine = engine_over(repo, &config);

        let outcome = engine.handle(&MapQuery::partition("post", 1)).await.unwrap();
        assert_eq!(outcome, MapOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_homepage_synthesized_for_root_kind() {
        let config = test_config();
        let mut set = content_with_posts(0);
        set.items.insert(
            "page".to_string(),
            vec![ContentRecord {
                id: 1,
                permalink: "/about".into(),
                modified_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
                images: Vec::new(),
            }],
        );
        let engine = engine_over(Arc::new(StaticRepository::new(set)), &config);

        let body = body_of(engine.handle(&MapQuery::partition("page", 1)).await.unwrap());
        let home_pos = body.find("<loc>https://example.com/</loc>").unwrap();
        let about_pos = body.find("<loc>https://example.com/about</loc>").unwrap();
        assert!(home_pos < about_pos);
    }

    #[tokio::test]
    async fn test_native_deferral_and_override() {
        let mut config = test_config();
        config.site.native_map_url = Some("https://example.com/native-map.xml".into());
        let repo: Arc<dyn ContentRepository> =
            Arc::new(StaticRepository::new(content_with_posts(1)));

        let engine = engine_over(Arc::clone(&repo), &config);
        assert_eq!(
            engine.handle(&MapQuery::index()).await.unwrap(),
            MapOutcome::Redirect("https://example.com/native-map.xml".into())
        );

        config.map.override_native = true;
        let engine = engine_over(repo, &config);
        assert!(matches!(
            engine.handle(&MapQuery::index()).await.unwrap(),
            MapOutcome::Document { .. }
        ));
    }

    #[tokio::test]
    async fn test_gzip_on_request() {
        use std::io::Read;

        let config = test_config();
        let repo = Arc::new(StaticRepository::new(content_with_posts(1)));
        let engine = engine_over(repo, &config);

        let plain = body_of(engine.handle(&MapQuery::partition("post", 1)).await.unwrap());

        let outcome = engine
            .handle(&MapQuery::partition("post", 1).gzipped())
            .await
            .unwrap();
        let MapOutcome::Document { body, gzipped } = outcome else {
            panic!("expected document");
        };
        assert!(gzipped);

        let mut decoder = flate2::read::GzDecoder::new(&body[..]);
        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, plain);
    }

    #[tokio::test]
    async fn test_extensions_augment_entries() {
        struct Landing;
        #[async_trait]
        impl MapExtension for Landing {
            fn augment_entries(&self, kind: &str, mut entries: Vec<UrlEntry>) -> Vec<UrlEntry> {
                if kind == "post" {
                    entries.push(UrlEntry::new(
                        "https://example.com/campaign",
                        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
                    ));
                }
                entries
            }
        }

        let config = test_config();
        let repo = Arc::new(StaticRepository::new(content_with_posts(1)));
        let mut engine = engine_over(repo, &config);
        engine.add_extension(Arc::new(Landing));

        let body = body_of(engine.handle(&MapQuery::partition("post", 1)).await.unwrap());
        assert!(body.contains("https://example.com/campaign"));
    }

    #[tokio::test]
    async fn test_rebuild_notification_carries_partition_count() {
        struct Recorder(AtomicUsize);
        #[async_trait]
        impl MapExtension for Recorder {
            async fn map_rebuilt(&self, partitions: u32) {
                self.0.store(partitions as usize, Ordering::SeqCst);
            }
        }

        let config = test_config();
        let repo = Arc::new(StaticRepository::new(content_with_posts(3)));
        let mut engine = engine_over(repo, &config);
        let recorder = Arc::new(Recorder(AtomicUsize::new(0)));
        engine.add_extension(Arc::clone(&recorder) as Arc<dyn MapExtension>);

        engine.handle(&MapQuery::index()).await.unwrap();
        assert_eq!(recorder.0.load(Ordering::SeqCst), 2);
    }
}
