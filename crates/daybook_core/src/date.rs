//! Date parsing and display helpers.
//!
//! Natural language dates are parsed via chrono-english.
//!
//! # Supported Date Formats
//!
//! - **Relative**: `"today"`, `"yesterday"`, `"tomorrow"`, `"3 days ago"`
//! - **Named days**: `"last friday"`, `"next monday"`
//! - **ISO 8601**: `"2026-01-16"`
//!
//! Months accept `"2026-01"` or anything [`parse_date`] accepts.

use chrono::{Duration, Local, NaiveDate};
use chrono_english::{Dialect, parse_date_string};

use crate::error::{DaybookError, Result};
use crate::naming::{MonthKey, parse_month_key};

/// Parse a date string into a NaiveDate
/// Supports natural language dates via chrono-english:
/// - "today", "yesterday", "tomorrow"
/// - "3 days ago", "in 5 days"
/// - "last friday", "next monday"
/// - "YYYY-MM-DD" format
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    let date_str = date_str.trim();

    // First try parsing as YYYY-MM-DD for exact dates
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(date);
    }

    parse_date_string(date_str, Local::now(), Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|_| DaybookError::InvalidDateFormat(date_str.to_string()))
}

/// Parse a month as `YYYY-MM`, falling back to the month of a date expression.
pub fn parse_month(month_str: &str) -> Result<MonthKey> {
    let month_str = month_str.trim();
    if let Some(month) = parse_month_key(month_str) {
        return Ok(month);
    }
    parse_date(month_str)
        .map(MonthKey::of)
        .map_err(|_| DaybookError::InvalidMonthFormat(month_str.to_string()))
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Human-facing form of a day, e.g. `Jan 16, 2026`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// The day `offset_days` away from `date`.
pub fn adjacent_date(date: NaiveDate, offset_days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(offset_days))
}
