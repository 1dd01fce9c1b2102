//! The journal as seen by a front end.
//!
//! [`Journal`] wraps the autosave coordinator and the root settings behind
//! the handful of calls an editor screen makes. Every call answers with a
//! [`JournalView`]: the entry text, a preview with attachment links
//! resolved for rendering, the entry dates of the shown month, and the
//! error banner if the last operation failed.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::sync::watch;

use crate::autosave::{AutosaveCoordinator, AutosaveState, SaveOutcome};
use crate::config::RootSettings;
use crate::date::display_date;
use crate::error::{Result, SerializableError};
use crate::fs::{DocumentTree, RootHandle};
use crate::ingest::{AttachmentSource, CopiedAttachment};
use crate::links::resolve_links;
use crate::naming::MonthKey;
use crate::store::AttachmentIndex;

/// Everything a front end needs to draw the editor.
#[derive(Debug, Clone, Serialize)]
pub struct JournalView {
    /// Selected day
    pub date: NaiveDate,
    /// Selected day formatted for headings, e.g. `Jan 16, 2026`
    pub title: String,
    /// Month whose entry dates are listed
    pub month: MonthKey,
    /// Live entry text, canonical links only
    pub text: String,
    /// `text` with attachment links resolved to locators; never persisted
    pub preview: String,
    /// Days of `month` that have an entry file
    pub entry_dates: BTreeSet<NaiveDate>,
    /// Attachments stored for the selected day's month
    pub attachments: AttachmentIndex,
    /// Save pipeline state
    pub state: AutosaveState,
    /// Attachments stored by the call that produced this view
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attached: Vec<CopiedAttachment>,
    /// Outcome of the explicit save that produced this view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<SaveOutcome>,
    /// Banner for the last failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SerializableError>,
}

/// Entry point for front ends.
pub struct Journal<T: DocumentTree + 'static> {
    autosave: AutosaveCoordinator<T>,
    settings: Arc<dyn RootSettings>,
}

impl<T: DocumentTree + 'static> Journal<T> {
    /// Create a journal with the default autosave debounce.
    pub fn new(tree: T, settings: Arc<dyn RootSettings>) -> Self {
        let autosave = AutosaveCoordinator::new(tree, Arc::clone(&settings));
        Self { autosave, settings }
    }

    /// Create a journal with a custom autosave debounce.
    pub fn with_debounce(tree: T, settings: Arc<dyn RootSettings>, debounce: Duration) -> Self {
        let autosave = AutosaveCoordinator::with_debounce(tree, Arc::clone(&settings), debounce);
        Self { autosave, settings }
    }

    /// The root currently selected, if any.
    pub async fn current_root(&self) -> Option<RootHandle> {
        self.settings.current_root().await
    }

    /// Select a new root (or clear it) and reload the selected day from it.
    pub async fn set_root(&self, root: Option<RootHandle>) -> Result<JournalView> {
        self.settings.set_root(root).await?;
        let date = self.autosave.snapshot().date;
        Ok(self.load_date(date).await)
    }

    /// Select `date` and load its entry.
    pub async fn load_date(&self, date: NaiveDate) -> JournalView {
        if let Err(e) = self.autosave.on_day_selected(date).await {
            log::debug!("Loading {} failed: {}", date, e);
        }
        self.view()
    }

    /// Show the entry dates of `month`; the selected day stays as it is.
    pub async fn load_month(&self, month: MonthKey) -> JournalView {
        if let Err(e) = self.autosave.on_month_selected(month).await {
            log::debug!("Listing {} failed: {}", month, e);
        }
        self.view()
    }

    /// Record an edit; it is saved once typing pauses.
    pub fn on_text_changed(&self, text: impl Into<String>) -> JournalView {
        self.autosave.on_edit(text);
        self.view()
    }

    /// Save the live text immediately.
    ///
    /// `saved` on the returned view tells whether anything was written.
    pub async fn save_now(&self) -> JournalView {
        let saved = match self.autosave.save_now().await {
            Ok(outcome) => {
                if outcome == SaveOutcome::Skipped {
                    log::debug!("Nothing loaded; save skipped");
                }
                Some(outcome)
            }
            Err(e) => {
                log::debug!("Save failed: {}", e);
                None
            }
        };
        JournalView {
            saved,
            ..self.view()
        }
    }

    /// Copy files into the selected day's month and link them from its entry.
    pub async fn attach_files<S: AttachmentSource>(&self, sources: &[S]) -> JournalView {
        let now = Local::now().naive_local();
        let attached = match self.autosave.attach(sources, now).await {
            Ok(attached) => attached,
            Err(e) => {
                log::debug!("Attaching failed: {}", e);
                Vec::new()
            }
        };
        JournalView {
            attached,
            ..self.view()
        }
    }

    /// The current view, without doing any I/O.
    pub fn view(&self) -> JournalView {
        let snapshot = self.autosave.snapshot();
        JournalView {
            date: snapshot.date,
            title: display_date(snapshot.date),
            month: snapshot.month,
            preview: resolve_links(&snapshot.text, &snapshot.attachments),
            text: snapshot.text,
            entry_dates: snapshot.entry_dates,
            attachments: snapshot.attachments,
            state: snapshot.state,
            attached: Vec::new(),
            saved: None,
            error: snapshot.error,
        }
    }

    /// Revision counter that changes whenever a background save or load
    /// changes what [`view`](Self::view) would return.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.autosave.subscribe()
    }
}
