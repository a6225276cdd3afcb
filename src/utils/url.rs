// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

use crate::error::Result;

/// Resolve a potentially relative path against the site base URL.
///
/// Absolute inputs are re-parsed so the output is always a normalized,
/// fully-escaped URL string.
///
/// # Examples
/// ```
/// use url::Url;
/// use sitemapper::utils::url::absolutize;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// assert_eq!(
///     absolutize(&base, "/about us").unwrap(),
///     "https://example.com/about%20us"
/// );
/// ```
pub fn absolutize(base: &Url, href: &str) -> Result<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Ok(Url::parse(href)?.to_string());
    }
    Ok(base.join(href)?.to_string())
}

/// Extract the lowercased host from a URL, if it has one.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}
