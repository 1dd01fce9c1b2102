//! Attachment command handlers

use std::path::PathBuf;

use daybook_core::FileSource;

use crate::cli::CliJournal;
use crate::cli::util::{report, resolve_date, resolve_month};

/// Handle the attach command
/// Returns true if every file was attached
pub async fn handle_attach(journal: &CliJournal, date: Option<&str>, files: &[PathBuf]) -> bool {
    let Some(date) = resolve_date(date) else {
        return false;
    };

    let view = journal.load_date(date).await;
    if !report(&view) {
        return false;
    }

    let sources: Vec<FileSource> = files.iter().map(FileSource::new).collect();
    let attached = journal.attach_files(&sources).await;
    if !report(&attached) {
        return false;
    }

    // Persist the new links now rather than waiting for the debounce.
    let saved = journal.save_now().await;
    if !report(&saved) {
        return false;
    }

    for attachment in &attached.attached {
        println!("✓ Attached {}", attachment.name);
    }

    let missing = files.len() - attached.attached.len();
    if missing > 0 {
        eprintln!(
            "✗ {} of {} file(s) could not be attached (see warnings above)",
            missing,
            files.len()
        );
        return false;
    }
    true
}

/// Handle the attachments command
/// Returns true on success, false on error
pub async fn handle_attachments(journal: &CliJournal, month: Option<&str>) -> bool {
    let Some(month) = resolve_month(month) else {
        return false;
    };

    let view = journal.load_date(month.first_day()).await;
    if !report(&view) {
        return false;
    }

    if view.attachments.is_empty() {
        println!("No attachments in {}", month);
        return true;
    }
    for (name, locator) in &view.attachments {
        println!("{}  {}", name, locator);
    }
    true
}
