// src/utils/mod.rs

//! Shared helpers for URL handling and time formatting.

pub mod time;
pub mod url;

pub use url::absolutize;
