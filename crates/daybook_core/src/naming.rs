//! Canonical names for months, entries and attachments.
//!
//! Everything in this module is pure: it turns dates into the folder and file
//! names used on disk, parses them back, and derives collision-safe names for
//! attachments from whatever display name the user's source provided.
//!
//! # Layout
//!
//! ```text
//! <root>/2026-01/                       month folder   (format_month_key)
//! <root>/2026-01/2026-01-16.md          entry file     (format_entry_file_name)
//! <root>/2026-01/attachments/<name>     attachment     (attachment_name)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the per-month folder holding attachments.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Used when a display name is empty after trimming.
pub const PLACEHOLDER_NAME: &str = "attachment";

/// Used when a source does not report a MIME type.
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Content type for entry files.
pub const MARKDOWN_MIME: &str = "text/markdown";

const MONTH_FORMAT: &str = "%Y-%m";
const ENTRY_FORMAT: &str = "%Y-%m-%d";
const ENTRY_SUFFIX: &str = ".md";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";
const RESERVED_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// A calendar month, the unit of folder grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Returns `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Construction already validated the year/month pair.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Whether `date` falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_month_key(*self))
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_month_key(s).ok_or_else(|| s.to_string())
    }
}

impl TryFrom<String> for MonthKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        MonthKey::of(date)
    }
}

/// `YYYY-MM`
pub fn format_month_key(month: MonthKey) -> String {
    month.first_day().format(MONTH_FORMAT).to_string()
}

/// Inverse of [`format_month_key`]. Anything else is `None`.
pub fn parse_month_key(name: &str) -> Option<MonthKey> {
    // chrono needs a day to parse; only accept the exact canonical shape.
    let date = NaiveDate::parse_from_str(&format!("{name}-01"), ENTRY_FORMAT).ok()?;
    let month = MonthKey::of(date);
    (format_month_key(month) == name).then_some(month)
}

/// `YYYY-MM-DD.md`
pub fn format_entry_file_name(date: NaiveDate) -> String {
    format!("{}{}", date.format(ENTRY_FORMAT), ENTRY_SUFFIX)
}

/// Inverse of [`format_entry_file_name`]. Stray files parse to `None`.
pub fn parse_entry_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(ENTRY_SUFFIX)?;
    let date = NaiveDate::parse_from_str(stem, ENTRY_FORMAT).ok()?;
    (format_entry_file_name(date) == name).then_some(date)
}

/// Relative location of an entry below the root, for messages and logs.
pub fn entry_path(date: NaiveDate) -> String {
    format!(
        "{}/{}",
        format_month_key(MonthKey::of(date)),
        format_entry_file_name(date)
    )
}

/// Relative location of an attachment below the root.
pub fn attachment_path(month: MonthKey, name: &str) -> String {
    format!("{}/{}/{}", format_month_key(month), ATTACHMENTS_DIR, name)
}

/// `YYYY-MM-DD_HHMMSS`, second resolution.
pub fn attachment_timestamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Make a display name safe to use as a file name.
pub fn sanitize(display_name: &str) -> String {
    let trimmed = display_name.trim();
    let trimmed = if trimmed.is_empty() {
        PLACEHOLDER_NAME
    } else {
        trimmed
    };
    trimmed.replace(RESERVED_CHARS, "_")
}

/// Split `name` at its last dot, unless that dot leads or trails the name.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot < name.len() - 1 => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    }
}

/// Join a base and an optional extension.
pub fn with_extension(base: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) if !ext.trim().is_empty() => format!("{base}.{ext}"),
        _ => base.to_string(),
    }
}

/// Eight hex characters taken from a random v4 UUID.
pub fn unique_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Destination name for an attachment ingested at `now`.
///
/// Tries `<timestamp>_<base>.<ext>` first; when `is_taken` reports that name
/// as used, falls back to `<timestamp>_<base>_<suffix>.<ext>`.
pub fn attachment_name(
    display_name: &str,
    now: NaiveDateTime,
    is_taken: impl Fn(&str) -> bool,
) -> String {
    let safe = sanitize(display_name);
    let (base, ext) = split_extension(&safe);
    let stamped = format!("{}_{}", attachment_timestamp(now), base);

    let candidate = with_extension(&stamped, ext);
    if !is_taken(&candidate) {
        return candidate;
    }
    with_extension(&format!("{}_{}", stamped, unique_suffix()), ext)
}

/// True iff the MIME type's top-level type is `image`.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Best-effort MIME type for a file name, based on its extension.
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let ext = split_extension(name).1?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" | "markdown" => MARKDOWN_MIME,
        "csv" => "text/csv",
        "json" => "application/json",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, date};

    #[test]
    fn month_key_formats_as_year_month() {
        let month = MonthKey::new(2026, 1).unwrap();
        assert_eq!(format_month_key(month), "2026-01");
        assert_eq!(month.to_string(), "2026-01");
    }

    #[test]
    fn month_key_round_trips() {
        for (year, m) in [(2026, 1), (1999, 12), (2024, 2)] {
            let month = MonthKey::new(year, m).unwrap();
            assert_eq!(parse_month_key(&format_month_key(month)), Some(month));
        }
    }

    #[test]
    fn malformed_month_keys_do_not_match() {
        for name in ["2026-1", "2026-13", "attachments", "2026-01-16", ""] {
            assert_eq!(parse_month_key(name), None, "{name}");
        }
    }

    #[test]
    fn month_contains_only_its_own_days() {
        let december = MonthKey::new(2025, 12).unwrap();
        assert!(december.contains(date(2025, 12, 31)));
        assert!(!december.contains(date(2026, 1, 1)));
    }

    #[test]
    fn entry_file_name_formats_as_date_markdown() {
        assert_eq!(format_entry_file_name(date(2026, 1, 16)), "2026-01-16.md");
        assert_eq!(entry_path(date(2026, 1, 16)), "2026-01/2026-01-16.md");
    }

    #[test]
    fn entry_file_name_round_trips() {
        let mut day = date(2024, 1, 1);
        while day < date(2025, 1, 1) {
            assert_eq!(parse_entry_file_name(&format_entry_file_name(day)), Some(day));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn stray_entry_names_do_not_match() {
        for name in [
            "README.txt",
            "2026-01-16.txt",
            "2026-01-16",
            "2026-1-16.md",
            "2026-02-30.md",
            "notes.md",
            "2026-01-16.md.bak",
        ] {
            assert_eq!(parse_entry_file_name(name), None, "{name}");
        }
    }

    #[test]
    fn attachment_timestamp_formats() {
        assert_eq!(
            attachment_timestamp(at(2026, 1, 16, 9, 5, 2)),
            "2026-01-16_090502"
        );
    }

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize("a/b:c"), "a_b_c");
        assert_eq!(sanitize(r#"x\y*z?"<>|"#), "x_y_z_____");
    }

    #[test]
    fn sanitize_trims_and_substitutes_placeholder() {
        assert_eq!(sanitize("  Cat Photo.PNG  "), "Cat Photo.PNG");
        assert_eq!(sanitize("   "), PLACEHOLDER_NAME);
        assert_eq!(sanitize(""), PLACEHOLDER_NAME);
    }

    #[test]
    fn split_extension_handles_common_shapes() {
        assert_eq!(split_extension("photo.jpg"), ("photo", Some("jpg")));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_extension(".bashrc"), (".bashrc", None));
        assert_eq!(split_extension("trailing."), ("trailing.", None));
        assert_eq!(split_extension("noext"), ("noext", None));
    }

    #[test]
    fn with_extension_appends_extension() {
        assert_eq!(with_extension("note", Some("txt")), "note.txt");
        assert_eq!(with_extension("note", None), "note");
    }

    #[test]
    fn unique_suffix_is_eight_hex_chars() {
        let suffix = unique_suffix();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn attachment_name_prefers_timestamped_name() {
        let name = attachment_name("cat.png", at(2026, 1, 16, 9, 5, 2), |_| false);
        assert_eq!(name, "2026-01-16_090502_cat.png");
    }

    #[test]
    fn attachment_name_falls_back_to_suffix_on_collision() {
        let now = at(2026, 1, 16, 9, 5, 2);
        let name = attachment_name("cat.png", now, |n| n == "2026-01-16_090502_cat.png");

        assert_ne!(name, "2026-01-16_090502_cat.png");
        assert!(name.starts_with("2026-01-16_090502_cat_"));
        assert!(name.ends_with(".png"));
        // timestamp + "_cat_" + 8 hex + ".png"
        assert_eq!(name.len(), "2026-01-16_090502_cat_".len() + 8 + ".png".len());
    }

    #[test]
    fn attachment_name_without_extension() {
        let name = attachment_name("  ", at(2026, 3, 1, 0, 0, 0), |_| false);
        assert_eq!(name, "2026-03-01_000000_attachment");
    }

    #[test]
    fn image_mime_detection_is_case_insensitive() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("IMAGE/JPEG"));
        assert!(!is_image_mime("application/pdf"));
        assert!(!is_image_mime(DEFAULT_MIME));
    }

    #[test]
    fn mime_lookup_uses_extension() {
        assert_eq!(mime_for_name("cat.PNG"), Some("image/png"));
        assert_eq!(mime_for_name("notes.pdf"), Some("application/pdf"));
        assert_eq!(mime_for_name("mystery.xyz"), None);
        assert_eq!(mime_for_name(".bashrc"), None);
    }
}
