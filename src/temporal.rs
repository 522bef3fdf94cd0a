//! Date parsing for search-provider timestamps and the recency window.
//!
//! Search providers report publication times loosely: `"3 hours ago"`,
//! `"2 days ago"`, `"45 mins ago"`, or an absolute `2025-05-06`. Relative
//! values are resolved against the current time, read fresh on every call,
//! so a long batch drifts slightly between its first and last item.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static LEADING_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)(?:\s|$)").expect("valid leading count regex"));

/// Parse a publication time relative to now.
pub fn parse_recency(text: &str) -> Option<DateTime<Utc>> {
    parse_recency_at(text, Utc::now())
}

/// Parse a publication time relative to `now`.
///
/// Priority: hour/minute-relative, then day-relative, then absolute
/// `YYYY-MM-DD`. Minute values carry no hour count and resolve to `now`.
/// Anything unparseable yields `None`.
pub fn parse_recency_at(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let parsed = if lowered.contains("hour") || lowered.contains("min") {
        let hours = if lowered.contains("hour") {
            leading_count(&lowered)?
        } else {
            0
        };
        now.checked_sub_signed(Duration::try_hours(hours)?)
    } else if lowered.contains("day") {
        let days = leading_count(&lowered)?;
        now.checked_sub_signed(Duration::try_days(days)?)
    } else {
        parse_absolute_date(&lowered)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc())
    };

    if parsed.is_none() {
        debug!(%text, "Unparseable publication date");
    }
    parsed
}

/// Strict `YYYY-MM-DD` parse. Relative descriptions are rejected.
pub fn parse_absolute_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Whether `published` is no older than `lookback_hours` as of now.
pub fn within_lookback(published: DateTime<Utc>, lookback_hours: i64) -> bool {
    within_lookback_at(published, lookback_hours, Utc::now())
}

pub fn within_lookback_at(published: DateTime<Utc>, lookback_hours: i64, now: DateTime<Utc>) -> bool {
    match Duration::try_hours(lookback_hours) {
        Some(window) => now.signed_duration_since(published) <= window,
        None => true,
    }
}

fn leading_count(text: &str) -> Option<i64> {
    LEADING_COUNT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}
