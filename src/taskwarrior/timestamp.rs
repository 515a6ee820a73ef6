//! TaskWarrior timestamps.
//!
//! Exports use the compact UTC form `20240423T060000Z`. Imports also accept
//! RFC 3339, bare `YYYY-MM-DD`, naive ISO date-times and the epoch-second
//! strings TaskChampion keeps in its `data` blobs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::syntax::{self, DATE_FORMAT};

pub const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub fn to_compact(at: DateTime<Utc>) -> String {
    at.format(COMPACT_FORMAT).to_string()
}

/// Compact midnight-UTC timestamp for a `YYYY-MM-DD` due date.
pub fn date_to_compact(date: &str) -> Option<String> {
    let day = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    let midnight = day.and_hms_opt(0, 0, 0)?;
    Some(midnight.format(COMPACT_FORMAT).to_string())
}

/// Normalize an external timestamp to the UTC calendar date it falls on.
pub fn to_due_date(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if syntax::is_valid_date(value) {
        return Some(value.to_string());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, COMPACT_FORMAT) {
        return Some(naive.date().format(DATE_FORMAT).to_string());
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc).date_naive().format(DATE_FORMAT).to_string());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.date().format(DATE_FORMAT).to_string());
    }
    if value.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = value.parse().ok()?;
        let at = DateTime::from_timestamp(secs, 0)?;
        return Some(at.date_naive().format(DATE_FORMAT).to_string());
    }
    None
}
