// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site identity and native generator settings
    #[serde(default)]
    pub site: SiteConfig,

    /// Content map generation settings
    #[serde(default)]
    pub map: MapConfig,

    /// Audit lifecycle settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Remote audit service settings
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.site.base_url()?;
        if let Some(native) = &self.site.native_map_url {
            if native.trim().is_empty() {
                return Err(AppError::validation("site.native_map_url is empty"));
            }
        }
        if self.map.per_page == 0 {
            return Err(AppError::validation("map.per_page must be > 0"));
        }
        if self.map.content_kinds.is_empty() {
            return Err(AppError::validation("No content kinds defined"));
        }
        for kind in &self.map.root_kinds {
            if !self.map.content_kinds.contains(kind) {
                return Err(AppError::validation(format!(
                    "map.root_kinds entry '{}' is not a content kind",
                    kind
                )));
            }
        }
        if self.audit.stale_after_secs == 0 {
            return Err(AppError::validation("audit.stale_after_secs must be > 0"));
        }
        if self.remote.timeout_secs == 0 {
            return Err(AppError::validation("remote.timeout_secs must be > 0"));
        }
        if self.remote.base_url.trim().is_empty() {
            return Err(AppError::validation("remote.base_url is empty"));
        }
        Ok(())
    }
}

/// Site identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute base URL of the site
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// URL of the host environment's own map generator, when one exists.
    /// Requests are redirected there unless `map.override_native` is set.
    #[serde(default)]
    pub native_map_url: Option<String>,
}

impl SiteConfig {
    /// Parse the configured base URL.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| AppError::validation(format!("site.base_url: {}", e)))?;
        if url.host_str().is_none() {
            return Err(AppError::validation("site.base_url must be absolute"));
        }
        Ok(url)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            native_map_url: None,
        }
    }
}

/// Content map generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Maximum entries per partition page
    #[serde(default = "defaults::per_page")]
    pub per_page: u32,

    /// Content kinds served by the posts source
    #[serde(default = "defaults::content_kinds")]
    pub content_kinds: Vec<String>,

    /// Taxonomies served by the terms source
    #[serde(default = "defaults::taxonomies")]
    pub taxonomies: Vec<String>,

    /// Kinds whose first page carries a synthesized homepage entry
    #[serde(default = "defaults::root_kinds")]
    pub root_kinds: Vec<String>,

    /// Serve our own map even when a native generator is present
    #[serde(default)]
    pub override_native: bool,

    /// Enable the community groups source
    #[serde(default)]
    pub groups_enabled: bool,

    /// Enable the member profiles source
    #[serde(default)]
    pub profiles_enabled: bool,

    /// Operator-added paths served as their own partition
    #[serde(default)]
    pub extra_paths: Vec<ExtraPath>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            per_page: defaults::per_page(),
            content_kinds: defaults::content_kinds(),
            taxonomies: defaults::taxonomies(),
            root_kinds: defaults::root_kinds(),
            override_native: false,
            groups_enabled: false,
            profiles_enabled: false,
            extra_paths: Vec::new(),
        }
    }
}

/// An operator-added path included in the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraPath {
    /// Site-relative path or absolute URL
    pub path: String,

    /// Explicit last-modified date; build time is used when absent
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

/// Audit lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Seconds after which an unresponsive in-progress run is forced to
    /// complete with a timeout result
    #[serde(default = "defaults::stale_after")]
    pub stale_after_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: defaults::stale_after(),
        }
    }
}

/// Remote audit service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the audit API
    #[serde(default = "defaults::remote_base_url")]
    pub base_url: String,

    /// Bearer credential
    #[serde(default)]
    pub token: String,

    /// Bounded wait for outbound calls, in seconds
    #[serde(default = "defaults::remote_timeout")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::remote_base_url(),
            token: String::new(),
            timeout_secs: defaults::remote_timeout(),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://example.com".into()
    }
    pub fn per_page() -> u32 {
        1000
    }
    pub fn content_kinds() -> Vec<String> {
        vec!["post".into(), "page".into()]
    }
    pub fn taxonomies() -> Vec<String> {
        vec!["category".into(), "tag".into()]
    }
    pub fn root_kinds() -> Vec<String> {
        vec!["post".into(), "page".into()]
    }
    pub fn stale_after() -> u64 {
        3600
    }
    pub fn remote_base_url() -> String {
        "https://audit.example.com/v1".into()
    }
    pub fn remote_timeout() -> u64 {
        30
    }
}
