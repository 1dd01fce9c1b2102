//! Attachment link rewriting for entry markdown.
//!
//! Entries always store the canonical, portable form
//! `attachments/<name>`. [`resolve_links`] produces a render-only copy with
//! those paths swapped for locators; that copy must never be written back.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::ingest::CopiedAttachment;
use crate::naming::ATTACHMENTS_DIR;
use crate::store::AttachmentIndex;

static ATTACHMENT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    // `(attachments/<anything but a closing paren>)`
    Regex::new(r"\((attachments/([^)]+))\)").expect("attachment link pattern is valid")
});

/// Canonical relative path for an attachment name.
pub fn canonical_path(name: &str) -> String {
    format!("{ATTACHMENTS_DIR}/{name}")
}

/// Markdown line referencing one attachment.
pub fn attachment_line(attachment: &CopiedAttachment) -> String {
    let path = canonical_path(&attachment.name);
    if attachment.is_image {
        format!("![{}]({})", attachment.name, path)
    } else {
        format!("- [{}]({})", attachment.name, path)
    }
}

/// Append one link line per attachment, separated from existing text by a
/// blank line. Empty documents get no leading blank line.
pub fn append_links(text: &str, attachments: &[CopiedAttachment]) -> String {
    let mut out = String::from(text);
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    for attachment in attachments {
        out.push_str(&attachment_line(attachment));
        out.push('\n');
    }
    out
}

/// Replace canonical attachment paths with locators from `index`.
///
/// Names missing from the index are left as they are.
pub fn resolve_links(text: &str, index: &AttachmentIndex) -> String {
    if index.is_empty() {
        return text.to_string();
    }
    ATTACHMENT_LINK
        .replace_all(text, |caps: &Captures<'_>| match index.get(&caps[2]) {
            Some(locator) => format!("({locator})"),
            None => caps[0].to_string(),
        })
        .into_owned()
}
