// src/utils/time.rs

//! Time formatting utilities.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp in the W3C datetime form used by map documents.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use sitemapper::utils::time::w3c_datetime;
///
/// let ts = Utc.with_ymd_and_hms(2026, 1, 15, 8, 30, 0).unwrap();
/// assert_eq!(w3c_datetime(&ts), "2026-01-15T08:30:00+00:00");
/// ```
pub fn w3c_datetime(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Humanize a duration in seconds as hours and minutes.
///
/// Used for cooldown messages shown to the operator. Durations under a
/// minute round up to "1 minute" so the message never reads as zero wait.
pub fn humanize_secs(secs: u64) -> String {
    let mut hours = secs / 3600;
    let mut minutes = (secs % 3600).div_ceil(60);
    if minutes == 60 {
        hours += 1;
        minutes = 0;
    }

    let mut parts = Vec::new();
    if hours == 1 {
        parts.push("1 hour".to_string());
    } else if hours > 1 {
        parts.push(format!("{} hours", hours));
    }
    if minutes == 1 {
        parts.push("1 minute".to_string());
    } else if minutes > 1 {
        parts.push(format!("{} minutes", minutes));
    }

    if parts.is_empty() {
        "1 minute".to_string()
    } else {
        parts.join(" ")
    }
}
