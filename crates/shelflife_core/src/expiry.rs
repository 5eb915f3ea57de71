//! Expiry date arithmetic.
//!
//! # Responsibility
//! - Parse stored expiry text into calendar dates.
//! - Classify an expiry date relative to a point in time.
//! - Provide the range filters shared by every storage backend.
//!
//! # Invariants
//! - Expiry dates are calendar dates; an expiry instant is 00:00 UTC of that day.
//! - `is_expired_at(expiry, now)` holds iff `days_until(expiry, now) < 0`.
//! - Unparsable expiry text is never matched by a range filter and never panics.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Outcome of comparing stored expiry text with a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Expiry day lies strictly before the current day.
    Expired { days_overdue: i64 },
    /// Expiry day is today or later.
    Current { days_left: i64 },
    /// Expiry text does not parse to a date.
    NotComparable,
}

/// Parses stored expiry text.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (truncated to their UTC date)
/// and SQLite `YYYY-MM-DD HH:MM:SS` timestamps.
pub fn parse_expiry(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, CANONICAL_DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|timestamp| timestamp.date())
}

/// Returns the canonical `YYYY-MM-DD` form, or `None` when unparsable.
pub fn canonical_expiry(value: &str) -> Option<String> {
    parse_expiry(value).map(|date| date.format(CANONICAL_DATE_FORMAT).to_string())
}

/// Returns the instant an expiry date starts (00:00 UTC).
pub fn expiry_instant(expiry: NaiveDate) -> DateTime<Utc> {
    expiry.and_time(NaiveTime::MIN).and_utc()
}

/// Whole days from `now` until `expiry`, rounded up. Negative once expired.
pub fn days_until(expiry: NaiveDate, now: DateTime<Utc>) -> i64 {
    let diff_ms = (expiry_instant(expiry) - now).num_milliseconds();
    let whole_days = diff_ms.div_euclid(MILLIS_PER_DAY);
    if diff_ms.rem_euclid(MILLIS_PER_DAY) == 0 {
        whole_days
    } else {
        whole_days + 1
    }
}

/// Whether `expiry` strictly precedes the calendar day of `now`.
pub fn is_expired_at(expiry: NaiveDate, now: DateTime<Utc>) -> bool {
    expiry < now.date_naive()
}

/// `days_until` over stored text; `None` when not comparable.
pub fn days_until_str(expiry: &str, now: DateTime<Utc>) -> Option<i64> {
    parse_expiry(expiry).map(|date| days_until(date, now))
}

/// `is_expired_at` over stored text; `None` when not comparable.
pub fn is_expired_at_str(expiry: &str, now: DateTime<Utc>) -> Option<bool> {
    parse_expiry(expiry).map(|date| is_expired_at(date, now))
}

pub fn classify(expiry: &str, now: DateTime<Utc>) -> ExpiryStatus {
    match days_until_str(expiry, now) {
        Some(days) if days < 0 => ExpiryStatus::Expired {
            days_overdue: -days,
        },
        Some(days) => ExpiryStatus::Current { days_left: days },
        None => ExpiryStatus::NotComparable,
    }
}

/// Whether `expiry` falls within `[today, today + days]`, inclusive.
pub fn within_window(expiry: &str, now: DateTime<Utc>, days: u32) -> bool {
    let Some(date) = parse_expiry(expiry) else {
        return false;
    };
    let today = now.date_naive();
    let window_end = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    date >= today && date <= window_end
}
