// src/models/content.rs

//! Records returned by the content repository.
//!
//! The repository is a read-only collaborator; these are the shapes the map
//! sources consume when building entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An ordinary content item (post, page, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentRecord {
    /// Stable numeric identifier; sources order by it ascending
    pub id: u64,

    /// Permalink, absolute or site-relative
    pub permalink: String,

    /// Last modification time
    pub modified_at: DateTime<Utc>,

    /// Attached images
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// An image attached to a content item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    pub src: String,

    #[serde(default)]
    pub title: String,
}

/// A taxonomy term (category, tag, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TermRecord {
    pub id: u64,
    pub permalink: String,
    pub modified_at: DateTime<Utc>,
}

/// A community group record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: u64,
    pub permalink: String,
    pub modified_at: DateTime<Utc>,
}

/// A member profile record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: u64,
    pub permalink: String,
    pub modified_at: DateTime<Utc>,
}
