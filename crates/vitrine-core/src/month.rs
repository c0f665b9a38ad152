//! Calendar-month helpers for the community vote cycle.
//!
//! Votes are keyed by `"YYYY-MM"` strings; these helpers produce, validate,
//! and reason about those keys.

use chrono::{DateTime, Datelike, Utc};

use crate::CoreError;

/// Month key for a timestamp, e.g. `"2025-06"`.
#[must_use]
pub fn month_key(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}

/// Parse a `"YYYY-MM"` key into `(year, month)`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidMonthKey`] for anything that is not four
/// digits, a dash, and a month in `01..=12`.
pub fn parse_month_key(key: &str) -> Result<(i32, u32), CoreError> {
    let invalid = || CoreError::InvalidMonthKey(key.to_string());

    let (year_part, month_part) = key.split_once('-').ok_or_else(invalid)?;
    if year_part.len() != 4 || month_part.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year_part.parse().map_err(|_| invalid())?;
    let month: u32 = month_part.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Days left in the calendar month after `now`'s date (0 on the last day).
#[must_use]
pub fn days_remaining_in_month(now: DateTime<Utc>) -> u32 {
    days_in_month(now.year(), now.month()).saturating_sub(now.day())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
