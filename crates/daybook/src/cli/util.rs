//! Shared utilities for CLI commands

use chrono::NaiveDate;
use daybook_core::JournalView;
use daybook_core::date::{parse_date, parse_month, today};
use daybook_core::naming::MonthKey;

/// Parse an optional date argument, defaulting to today.
/// Prints the error and returns None if the argument is invalid.
pub fn resolve_date(arg: Option<&str>) -> Option<NaiveDate> {
    match arg {
        None => Some(today()),
        Some(value) => match parse_date(value) {
            Ok(date) => Some(date),
            Err(e) => {
                eprintln!("✗ {}", e);
                None
            }
        },
    }
}

/// Parse an optional month argument, defaulting to the current month.
/// Prints the error and returns None if the argument is invalid.
pub fn resolve_month(arg: Option<&str>) -> Option<MonthKey> {
    match arg {
        None => Some(MonthKey::of(today())),
        Some(value) => match parse_month(value) {
            Ok(month) => Some(month),
            Err(e) => {
                eprintln!("✗ {}", e);
                None
            }
        },
    }
}

/// Print the view's error banner, if any. Returns true when there was none.
pub fn report(view: &JournalView) -> bool {
    match &view.error {
        Some(error) => {
            eprintln!("✗ {}", error.message);
            if error.kind == "RootInvalid" {
                eprintln!("  Run 'daybook init <folder>' to choose the journal folder.");
            }
            false
        }
        None => true,
    }
}

/// Text with `line` added at the end, on its own line.
pub fn append_line(text: &str, line: &str) -> String {
    let mut out = String::from(text);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(line);
    if !line.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_line_starts_a_new_line() {
        assert_eq!(append_line("", "first"), "first\n");
        assert_eq!(append_line("first", "second"), "first\nsecond\n");
        assert_eq!(append_line("first\n", "second\n"), "first\nsecond\n");
    }

    #[test]
    fn resolve_date_defaults_to_today() {
        assert_eq!(resolve_date(None), Some(today()));
        assert_eq!(
            resolve_date(Some("2026-01-16")),
            NaiveDate::from_ymd_opt(2026, 1, 16)
        );
        assert_eq!(resolve_date(Some("not a date at all")), None);
    }

    #[test]
    fn resolve_month_accepts_year_month() {
        assert_eq!(resolve_month(Some("2026-01")), MonthKey::new(2026, 1));
        assert_eq!(resolve_month(None), Some(MonthKey::of(today())));
    }
}
