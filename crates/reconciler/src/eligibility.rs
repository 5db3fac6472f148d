//! Not-before date gate.
//!
//! A record with a parsed not-before date is billed only once the current
//! time is strictly after midnight UTC of that date. A missing, empty or
//! unparseable date never holds a record back.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Calendar date format of the not-before column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether a record may be billed now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Check again on a later cycle.
    NotYetDue(NaiveDate),
}

/// Parse a `YYYY-MM-DD` value. Surrounding whitespace is ignored.
pub fn parse_not_before(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Decide eligibility for an optional not-before date at `now`.
pub fn check(not_before: Option<NaiveDate>, now: DateTime<Utc>) -> Eligibility {
    match not_before {
        Some(date) if now <= date.and_time(NaiveTime::MIN).and_utc() => {
            Eligibility::NotYetDue(date)
        }
        _ => Eligibility::Eligible,
    }
}
