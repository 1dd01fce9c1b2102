//! Debounced persistence of the entry being edited.
//!
//! The coordinator owns one edit session: the selected day, its live text,
//! the text last confirmed on disk and the month data shown next to it.
//!
//! ```text
//!            on_edit                timer fires
//!   Idle ─────────────▶ PendingSave ─────────────▶ Saving ──▶ Idle
//!    ▲                                                ▲
//!    │ load done                                      │ on_edit re-arms
//!   Suppressed ◀─── on_day_selected (from any state)
//! ```
//!
//! Every edit bumps a generation counter and re-arms a single timer task;
//! only the timer whose generation is still current saves. Every day
//! selection bumps an epoch counter, aborts the timer and makes any save
//! queued for the previous day a no-op. Saves and loads are serialized by an
//! async I/O lock, so at most one write is in flight.
//!
//! The coordinator spawns tasks and must be driven from inside a tokio
//! runtime.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::RootSettings;
use crate::date;
use crate::error::{DaybookError, Result, SerializableError};
use crate::fs::{DocumentTree, RootHandle};
use crate::ingest::{self, AttachmentSource, CopiedAttachment};
use crate::links;
use crate::naming::MonthKey;
use crate::store::{AttachmentIndex, DocumentStore};

/// Quiet period after the last edit before a background save.
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(800);

/// Where the session is in the save pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutosaveState {
    /// Nothing waiting to be written
    Idle,
    /// An edit armed the debounce timer
    PendingSave,
    /// A background save is writing
    Saving,
    /// A day is being loaded; edits are recorded but never saved
    Suppressed,
}

/// Result of one save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// The text was written
    Saved,
    /// The text already matched the file; nothing was written
    Unchanged,
    /// No save was attempted (superseded, loading, or nothing loaded)
    Skipped,
}

/// Read-only copy of the session, for building views.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub date: NaiveDate,
    pub month: MonthKey,
    pub text: String,
    pub state: AutosaveState,
    pub loaded: bool,
    pub attachments: AttachmentIndex,
    pub entry_dates: BTreeSet<NaiveDate>,
    pub error: Option<SerializableError>,
}

#[derive(Debug)]
struct EditSession {
    date: NaiveDate,
    /// Month whose entry dates are listed; follows the day unless browsed away.
    month: MonthKey,
    text: String,
    last_saved: String,
    state: AutosaveState,
    generation: u64,
    epoch: u64,
    /// False until a load for `date` succeeded; nothing is saved before that.
    loaded: bool,
    attachments: AttachmentIndex,
    entry_dates: BTreeSet<NaiveDate>,
    error: Option<SerializableError>,
    timer: Option<JoinHandle<()>>,
}

impl EditSession {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            month: MonthKey::of(date),
            text: String::new(),
            last_saved: String::new(),
            state: AutosaveState::Idle,
            generation: 0,
            epoch: 0,
            loaded: false,
            attachments: AttachmentIndex::new(),
            entry_dates: BTreeSet::new(),
            error: None,
            timer: None,
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Debounce { generation: u64, epoch: u64 },
    Explicit,
}

struct LoadedDay {
    text: String,
    attachments: AttachmentIndex,
    entry_dates: BTreeSet<NaiveDate>,
}

struct Shared<T: DocumentTree> {
    store: DocumentStore<T>,
    settings: Arc<dyn RootSettings>,
    debounce: Duration,
    session: Mutex<EditSession>,
    io: tokio::sync::Mutex<()>,
    revision: watch::Sender<u64>,
}

/// Debounced autosave for a single edit session.
pub struct AutosaveCoordinator<T: DocumentTree + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: DocumentTree + 'static> Clone for AutosaveCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: DocumentTree + 'static> AutosaveCoordinator<T> {
    /// Create a coordinator with the default debounce, bound to today.
    pub fn new(tree: T, settings: Arc<dyn RootSettings>) -> Self {
        Self::with_debounce(tree, settings, AUTOSAVE_DEBOUNCE)
    }

    /// Create a coordinator with a custom debounce window.
    pub fn with_debounce(tree: T, settings: Arc<dyn RootSettings>, debounce: Duration) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                store: DocumentStore::new(tree),
                settings,
                debounce,
                session: Mutex::new(EditSession::new(date::today())),
                io: tokio::sync::Mutex::new(()),
                revision,
            }),
        }
    }

    /// Current pipeline state.
    pub fn state(&self) -> AutosaveState {
        self.shared.lock_session().state
    }

    /// Copy of the session for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.shared.lock_session();
        SessionSnapshot {
            date: session.date,
            month: session.month,
            text: session.text.clone(),
            state: session.state,
            loaded: session.loaded,
            attachments: session.attachments.clone(),
            entry_dates: session.entry_dates.clone(),
            error: session.error.clone(),
        }
    }

    /// Revision counter bumped whenever the session changes in the background.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Record new live text and (re)arm the debounce timer.
    ///
    /// While a day is loading the text is recorded only.
    pub fn on_edit(&self, text: impl Into<String>) {
        let mut session = self.shared.lock_session();
        session.text = text.into();
        session.generation += 1;
        if session.state == AutosaveState::Suppressed {
            log::debug!("Edit recorded while loading {}", session.date);
            return;
        }
        Shared::arm(&self.shared, &mut session);
    }

    /// Bind the session to `date` and load its entry and attachments.
    ///
    /// Any pending save for the previous day is discarded. A failed load
    /// leaves the session unloaded so nothing overwrites the day's file
    /// until a later load succeeds.
    pub async fn on_day_selected(&self, date: NaiveDate) -> Result<()> {
        let epoch = {
            let mut session = self.shared.lock_session();
            session.cancel_timer();
            session.epoch += 1;
            session.state = AutosaveState::Suppressed;
            session.date = date;
            session.month = MonthKey::of(date);
            session.loaded = false;
            session.epoch
        };
        self.shared.publish();

        let _io = self.shared.io.lock().await;
        let loaded = self.shared.load_day(date).await;

        if let Err(e) = &loaded {
            self.shared.record_failure(e).await;
        }

        {
            let mut session = self.shared.lock_session();
            if session.epoch != epoch {
                log::debug!("Load of {} superseded", date);
                return loaded.map(|_| ());
            }
            match &loaded {
                Ok(day) => {
                    session.text = day.text.clone();
                    session.last_saved = day.text.clone();
                    session.attachments = day.attachments.clone();
                    session.entry_dates = day.entry_dates.clone();
                    session.loaded = true;
                    session.error = None;
                }
                Err(_) => {
                    session.text.clear();
                    session.last_saved.clear();
                    session.attachments.clear();
                    session.entry_dates.clear();
                }
            }
            session.state = AutosaveState::Idle;
        }
        self.shared.publish();

        loaded.map(|_| ())
    }

    /// List the entry dates of `month` without changing the selected day.
    pub async fn on_month_selected(&self, month: MonthKey) -> Result<()> {
        let _io = self.shared.io.lock().await;
        let listed = async {
            let root = self.shared.current_root().await?;
            let folder = self.shared.store.resolve_month(&root, month).await?;
            self.shared.store.list_entry_dates(&folder).await
        }
        .await;

        match listed {
            Ok(dates) => {
                let mut session = self.shared.lock_session();
                session.month = month;
                session.entry_dates = dates;
            }
            Err(e) => {
                self.shared.record_failure(&e).await;
                self.shared.publish();
                return Err(e);
            }
        }
        self.shared.publish();
        Ok(())
    }

    /// Save the live text right away if it differs from the file.
    ///
    /// Leaves any armed timer in place; when it fires it finds nothing to do.
    pub async fn save_now(&self) -> Result<SaveOutcome> {
        self.shared.persist(Trigger::Explicit).await
    }

    /// Copy `sources` into the selected day's month and link them from its text.
    ///
    /// Links are appended to the text as it is once the copies are done, and
    /// only if the same day is still selected. Nothing is copied while the
    /// day's entry is not loaded, since its links could never be saved.
    pub async fn attach<S: AttachmentSource>(
        &self,
        sources: &[S],
        now: NaiveDateTime,
    ) -> Result<Vec<CopiedAttachment>> {
        let (date, epoch) = {
            let session = self.shared.lock_session();
            if !session.loaded {
                return Err(DaybookError::EntryNotLoaded(session.date));
            }
            (session.date, session.epoch)
        };

        let ingested = {
            let _io = self.shared.io.lock().await;
            async {
                let root = self.shared.current_root().await?;
                let folder = self
                    .shared
                    .store
                    .resolve_month(&root, MonthKey::of(date))
                    .await?;
                let copied = ingest::ingest(&self.shared.store, &folder, sources, now).await?;
                let index = self.shared.store.list_attachments(&folder).await?;
                Ok::<_, DaybookError>((copied, index))
            }
            .await
        };

        let (copied, index) = match ingested {
            Ok(result) => result,
            Err(e) => {
                self.shared.record_failure(&e).await;
                self.shared.publish();
                return Err(e);
            }
        };

        {
            let mut session = self.shared.lock_session();
            if session.epoch != epoch || session.state == AutosaveState::Suppressed {
                log::warn!(
                    "Day changed while attaching to {}; links were not added",
                    date
                );
            } else if !copied.is_empty() {
                session.attachments = index;
                session.text = links::append_links(&session.text, &copied);
                session.generation += 1;
                Shared::arm(&self.shared, &mut session);
            }
        }
        self.shared.publish();

        Ok(copied)
    }
}

impl<T: DocumentTree + 'static> Shared<T> {
    fn lock_session(&self) -> MutexGuard<'_, EditSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    async fn current_root(&self) -> Result<RootHandle> {
        self.settings
            .current_root()
            .await
            .ok_or(DaybookError::RootInvalid)
    }

    fn arm(shared: &Arc<Self>, session: &mut EditSession) {
        session.state = AutosaveState::PendingSave;
        let trigger = Trigger::Debounce {
            generation: session.generation,
            epoch: session.epoch,
        };
        let delay = shared.debounce;
        let owner = Arc::clone(shared);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Run the save on its own task so re-arming never aborts a write.
            tokio::spawn(async move {
                if let Err(e) = owner.persist(trigger).await {
                    log::warn!("Autosave failed: {}", e);
                }
            });
        });

        if let Some(previous) = session.timer.replace(timer) {
            previous.abort();
        }
    }

    async fn load_day(&self, date: NaiveDate) -> Result<LoadedDay> {
        let root = self.current_root().await?;
        let folder = self.store.resolve_month(&root, MonthKey::of(date)).await?;
        let text = self.store.read_entry(&folder, date).await?;
        let attachments = self.store.list_attachments(&folder).await?;
        let entry_dates = self.store.list_entry_dates(&folder).await?;
        log::debug!(
            "Loaded {} ({} bytes, {} attachments)",
            date,
            text.len(),
            attachments.len()
        );
        Ok(LoadedDay {
            text,
            attachments,
            entry_dates,
        })
    }

    async fn write_day(&self, date: NaiveDate, text: &str) -> Result<()> {
        let root = self.current_root().await?;
        let folder = self.store.resolve_month(&root, MonthKey::of(date)).await?;
        self.store.write_entry(&folder, date, text).await
    }

    async fn persist(&self, trigger: Trigger) -> Result<SaveOutcome> {
        let _io = self.io.lock().await;

        let (date, text, epoch) = {
            let mut session = self.lock_session();
            if let Trigger::Debounce { generation, epoch } = trigger
                && (session.generation != generation || session.epoch != epoch)
            {
                return Ok(SaveOutcome::Skipped);
            }
            if session.state == AutosaveState::Suppressed || !session.loaded {
                return Ok(SaveOutcome::Skipped);
            }
            if session.text == session.last_saved {
                if matches!(trigger, Trigger::Debounce { .. }) {
                    session.state = AutosaveState::Idle;
                }
                return Ok(SaveOutcome::Unchanged);
            }
            if matches!(trigger, Trigger::Debounce { .. }) {
                session.state = AutosaveState::Saving;
            }
            (session.date, session.text.clone(), session.epoch)
        };

        let written = self.write_day(date, &text).await;
        if let Err(e) = &written {
            self.record_failure(e).await;
        }

        {
            let mut session = self.lock_session();
            if written.is_ok() && session.epoch == epoch {
                session.last_saved = text;
                session.error = None;
                if session.month.contains(date) {
                    session.entry_dates.insert(date);
                }
            }
            if session.state == AutosaveState::Saving {
                session.state = AutosaveState::Idle;
            }
        }
        self.publish();

        written.map(|()| {
            log::info!("Saved entry for {}", date);
            SaveOutcome::Saved
        })
    }

    /// Surface `err` on the session; a lost root is also cleared from settings.
    async fn record_failure(&self, err: &DaybookError) {
        if err.is_root_invalid() {
            log::warn!("Journal root is no longer usable; clearing it");
            if let Err(e) = self.settings.set_root(None).await {
                log::warn!("Could not clear journal root: {}", e);
            }
        }
        self.lock_session().error = Some(err.to_serializable());
    }
}
