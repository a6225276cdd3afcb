// src/map/render.rs

//! XML serialization of map documents.
//!
//! Partitions become `<urlset>` documents with one `<url>` block per entry;
//! the index becomes a `<sitemapindex>` pointing at every partition. All
//! text content is XML-escaped and timestamps use the W3C datetime format.

use std::borrow::Cow;

use quick_xml::escape::escape;
use url::Url;

use crate::models::{IndexEntry, UrlEntry};
use crate::utils::time::w3c_datetime;

const URLSET_OPEN: &str = concat!(
    r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9""#,
    r#" xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">"#,
);
const INDEX_OPEN: &str =
    r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#;


/// XML-escape text content.
fn esc(raw: &str) -> Cow<'_, str> {
    escape(raw)
}

/// Render one partition document.
///
/// Entries without a location are expected to have been filtered already;
/// any stragglers are skipped here as a last line of defense.
pub fn render_partition(entries: &[UrlEntry]) -> String {
    let mut out = String::with_capacity(256 + entries.len() * 128);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(URLSET_OPEN);
    out.push('\n');

    for entry in entries.iter().filter(|e| e.has_location()) {
        out.push_str("  <url>\n");
        out.push_str(&format!("    <loc>{}</loc>\n", esc(&entry.loc)));
        out.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            w3c_datetime(&entry.lastmod)
        ));
        for image in &entry.images {
            out.push_str("    <image:image>\n");
            out.push_str(&format!(
                "      <image:loc>{}</image:loc>\n",
                esc(&image.src)
            ));
            if !image.title.is_empty() {
                out.push_str(&format!(
                    "      <image:title>{}</image:title>\n",
                    esc(&image.title)
                ));
            }
            out.push_str("    </image:image>\n");
        }
        out.push_str("  </url>\n");
    }

    out.push_str("</urlset>\n");
    out
}

/// Render the index document listing every partition.
pub fn render_index(base: &Url, summaries: &[IndexEntry]) -> String {
    let mut out = String::with_capacity(256 + summaries.len() * 160);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str(INDEX_OPEN);
    out.push('\n');

    for summary in summaries {
        for page in 1..=summary.pages.max(1) {
            out.push_str("  <sitemap>\n");
            out.push_str(&format!(
                "    <loc>{}</loc>\n",
                esc(&partition_location(base, &summary.kind, page))
            ));
            out.push_str(&format!(
                "    <lastmod>{}</lastmod>\n",
                w3c_datetime(&summary.lastmod)
            ));
            out.push_str("  </sitemap>\n");
        }
    }

    out.push_str("</sitemapindex>\n");
    out
}

/// Address of one partition page. Page 1 carries no page suffix.
pub fn partition_location(base: &Url, kind: &str, page: u32) -> String {
    let mut url = base.clone();
    let query = if page > 1 {
        format!("sitemap=1&sitemap_type={}&sitemap_page={}", kind, page)
    } else {
        format!("sitemap=1&sitemap_type={}", kind)
    };
    url.set_query(Some(&query));
    url.to_string()
}
