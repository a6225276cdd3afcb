// src/serve/mod.rs

//! HTTP surface for the map engine.
//!
//! A single route reads the map parameters from the query string and
//! translates the engine outcome into an HTTP response: an XML document
//! (optionally gzip-encoded), a 404, or a redirect to the host's native
//! generator.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::map::{MapEngine, MapOutcome, MapQuery};

/// Raw query parameters of a map request.
///
/// `sitemap` and `sitemap_gzip` are presence flags: any value, including
/// an empty one, switches them on.
#[derive(Debug, Default, Deserialize)]
pub struct MapParams {
    #[serde(default)]
    sitemap: Option<String>,

    #[serde(default)]
    sitemap_type: Option<String>,

    #[serde(default)]
    sitemap_page: Option<u32>,

    #[serde(default)]
    sitemap_gzip: Option<String>,
}

impl From<MapParams> for MapQuery {
    fn from(params: MapParams) -> Self {
        MapQuery {
            sitemap: params.sitemap.is_some(),
            kind: params.sitemap_type,
            page: params.sitemap_page.unwrap_or(0),
            gzip: params.sitemap_gzip.is_some(),
        }
    }
}

/// Build the router serving the content map.
pub fn router(engine: Arc<MapEngine>) -> Router {
    Router::new().route("/", get(handle_map)).with_state(engine)
}

async fn handle_map(
    State(engine): State<Arc<MapEngine>>,
    Query(params): Query<MapParams>,
) -> Response {
    let query: MapQuery = params.into();
    match engine.handle(&query).await {
        Ok(MapOutcome::Document { body, gzipped }) => {
            let mut response = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
                body,
            )
                .into_response();
            if gzipped {
                response.headers_mut().insert(
                    header::CONTENT_ENCODING,
                    header::HeaderValue::from_static("gzip"),
                );
            }
            response
        }
        Ok(MapOutcome::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Ok(MapOutcome::Redirect(location)) => Redirect::temporary(&location).into_response(),
        Err(e) => {
            log::error!("Map request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve the map on the given address until the task is cancelled.
pub async fn serve(engine: Arc<MapEngine>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Serving content map on {}", listener.local_addr()?);
    serve_with_listener(engine, listener).await
}

/// Serve the map on an already-bound listener.
pub async fn serve_with_listener(engine: Arc<MapEngine>, listener: TcpListener) -> Result<()> {
    axum::serve(listener, router(engine)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::content::{ContentSet, StaticRepository};
    use crate::map::MapCache;
    use crate::models::{Config, ContentRecord};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn engine() -> Arc<MapEngine> {
        let mut set = ContentSet::default();
        set.items.insert(
            "post".to_string(),
            vec![ContentRecord {
                id: 1,
                permalink: "/hello".into(),
                modified_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
                images: Vec::new(),
            }],
        );
        let mut config = Config::default();
        config.map.root_kinds = Vec::new();
        let repo = Arc::new(StaticRepository::new(set));
        let sources = crate::sources::assemble(&config, repo).unwrap();
        let cache = MapCache::new(Arc::new(MemoryStore::new()));
        Arc::new(MapEngine::new(&config, sources, cache).unwrap())
    }

    async fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_with_listener(engine(), listener));
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_serves_partition_xml() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{}/?sitemap=1&sitemap_type=post", base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert!(
            response
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("application/xml")
        );
        let body = response.text().await.unwrap();
        assert!(body.contains("https://example.com/hello"));
    }

    #[tokio::test]
    async fn test_gzip_flag_sets_content_encoding() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!(
                "{}/?sitemap=1&sitemap_type=post&sitemap_gzip",
                base
            ))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("content-encoding").unwrap(),
            "gzip"
        );
    }

    #[tokio::test]
    async fn test_unknown_kind_is_404() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .get(format!("{}/?sitemap=1&sitemap_type=movie", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_without_map_flag_is_404() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client.get(format!("{}/", base)).send().await.unwrap();
        assert_eq!(response.status(), 404);
    }
}
