#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Autosave (debounced persistence of the entry being edited)
pub mod autosave;

/// Configuration options and root settings
pub mod config;

/// Date parsing
pub mod date;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction (document trees)
pub mod fs;

/// Attachment ingest
pub mod ingest;

/// Journal (the interface front ends talk to)
pub mod journal;

/// Attachment link rewriting
pub mod links;

/// Month, entry and attachment naming
pub mod naming;

/// Entry and attachment storage
pub mod store;

#[cfg(test)]
pub mod test_utils;

pub use autosave::{AUTOSAVE_DEBOUNCE, AutosaveCoordinator, AutosaveState, SaveOutcome};
pub use config::{Config, ConfigStore, RootSettings, ThemeMode};
pub use error::{DaybookError, Result, SerializableError};
pub use fs::{DocumentTree, MemoryTree, RootHandle};
#[cfg(not(target_arch = "wasm32"))]
pub use fs::NativeTree;
pub use ingest::{AttachmentSource, BytesSource, CopiedAttachment, FileSource};
pub use journal::{Journal, JournalView};
pub use naming::MonthKey;
