// src/models/entry.rs

//! Map entry value objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One addressable URL in a content map partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlEntry {
    /// Absolute location of the content
    pub loc: String,

    /// Last modification time
    pub lastmod: DateTime<Utc>,

    /// Associated images, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRef>,
}

impl UrlEntry {
    /// Create an entry without images.
    pub fn new(loc: impl Into<String>, lastmod: DateTime<Utc>) -> Self {
        Self {
            loc: loc.into(),
            lastmod,
            images: Vec::new(),
        }
    }

    /// Entries without a location are dropped before serialization.
    pub fn has_location(&self) -> bool {
        !self.loc.trim().is_empty()
    }
}

/// An image attached to a map entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    /// Absolute image URL
    pub src: String,

    /// Image title
    pub title: String,
}

/// One partition descriptor in the top-level index.
///
/// Computed fresh on every index build; only the serialized index document
/// is ever cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexEntry {
    /// Partition kind (e.g. "post", "category")
    pub kind: String,

    /// Number of pages, always at least 1
    pub pages: u32,

    /// Most recent modification across the partition's entries
    pub lastmod: DateTime<Utc>,
}
