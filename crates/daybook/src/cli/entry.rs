//! Entry command handlers

use std::io::{self, Read};

use daybook_core::date::display_date;
use daybook_core::{JournalView, SaveOutcome};

use crate::cli::CliJournal;
use crate::cli::util::{append_line, report, resolve_date, resolve_month};

/// Handle the show command
/// Returns true on success, false on error
pub async fn handle_show(journal: &CliJournal, date: Option<&str>, preview: bool, json: bool) -> bool {
    let Some(date) = resolve_date(date) else {
        return false;
    };

    let view = journal.load_date(date).await;

    if json {
        return match serde_json::to_string_pretty(&view) {
            Ok(out) => {
                println!("{}", out);
                view.error.is_none()
            }
            Err(e) => {
                eprintln!("✗ Could not serialize view: {}", e);
                false
            }
        };
    }

    if !report(&view) {
        return false;
    }

    println!("# {}", view.title);
    println!();
    let body = if preview { &view.preview } else { &view.text };
    if body.is_empty() {
        println!("(no entry yet)");
    } else {
        print!("{}", body);
        if !body.ends_with('\n') {
            println!();
        }
    }
    true
}

/// Handle the list command
/// Returns true on success, false on error
pub async fn handle_list(journal: &CliJournal, month: Option<&str>) -> bool {
    let Some(month) = resolve_month(month) else {
        return false;
    };

    let view = journal.load_month(month).await;
    if !report(&view) {
        return false;
    }

    if view.entry_dates.is_empty() {
        println!("No entries in {}", month);
        return true;
    }
    for date in &view.entry_dates {
        println!("{}  {}", date, display_date(*date));
    }
    true
}

/// Handle the write command
/// Returns true on success, false on error
pub async fn handle_write(journal: &CliJournal, date: Option<&str>, text: Option<String>) -> bool {
    let Some(date) = resolve_date(date) else {
        return false;
    };

    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("✗ Could not read stdin: {}", e);
                return false;
            }
            buffer
        }
    };

    let view = journal.load_date(date).await;
    if !report(&view) {
        return false;
    }

    journal.on_text_changed(text);
    let view = journal.save_now().await;
    report_save(&view, "Saved entry")
}

/// Handle the append command
/// Returns true on success, false on error
pub async fn handle_append(journal: &CliJournal, date: Option<&str>, line: &str) -> bool {
    let Some(date) = resolve_date(date) else {
        return false;
    };

    let view = journal.load_date(date).await;
    if !report(&view) {
        return false;
    }

    journal.on_text_changed(append_line(&view.text, line));
    let view = journal.save_now().await;
    report_save(&view, "Appended to entry")
}

/// Print what an explicit save actually did
fn report_save(view: &JournalView, done: &str) -> bool {
    if !report(view) {
        return false;
    }
    match view.saved {
        Some(SaveOutcome::Saved) => {
            println!("✓ {} for {}", done, view.title);
            true
        }
        Some(SaveOutcome::Unchanged) => {
            println!("✓ Entry for {} is unchanged; nothing written", view.title);
            true
        }
        Some(SaveOutcome::Skipped) | None => {
            eprintln!("✗ Entry for {} was not saved", view.title);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use daybook_core::{Config, ConfigStore, Journal, MemoryTree};

    #[tokio::test]
    async fn report_save_follows_the_outcome() {
        let tree = MemoryTree::new("journal").with_file("2026-01/2026-01-16.md", "same");
        let settings = Arc::new(ConfigStore::in_memory(Config::new(tree.root_handle())));
        let journal = Journal::new(tree.clone(), settings);
        let day = NaiveDate::from_ymd_opt(2026, 1, 16).unwrap();
        journal.load_date(day).await;

        let view = journal.save_now().await;
        assert_eq!(view.saved, Some(SaveOutcome::Unchanged));
        assert!(report_save(&view, "Saved entry"));
        assert_eq!(tree.write_count(), 0);

        // A view that did not come from a save reports nothing written.
        assert!(!report_save(&journal.view(), "Saved entry"));
    }
}
