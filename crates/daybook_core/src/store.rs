//! Entry and attachment storage on top of a [`DocumentTree`].
//!
//! The store knows the journal layout and nothing else:
//!
//! ```text
//! <root>/YYYY-MM/YYYY-MM-DD.md
//! <root>/YYYY-MM/attachments/<name>
//! ```
//!
//! Folders are materialized lazily and always with find-before-create, so
//! concurrent callers resolving the same month end up with one folder.
//! Reads and listings never create anything.

use std::collections::{BTreeMap, BTreeSet};

use std::io::ErrorKind;

use chrono::NaiveDate;
use tokio::io::AsyncRead;

use crate::error::{DaybookError, Result};
use crate::fs::async_fs::{CopyError, copy_into, read_all, write_all};
use crate::fs::{DocumentTree, RootHandle};
use crate::naming::{
    self, ATTACHMENTS_DIR, MARKDOWN_MIME, MonthKey, format_entry_file_name, format_month_key,
};

/// Attachment file name → renderer locator, as listed from one month.
pub type AttachmentIndex = BTreeMap<String, String>;

/// A resolved month folder.
#[derive(Debug, Clone)]
pub struct MonthFolder<N> {
    pub month: MonthKey,
    pub node: N,
}

/// Reads and writes journal documents below a root handle.
pub struct DocumentStore<T: DocumentTree> {
    tree: T,
}

impl<T: DocumentTree> DocumentStore<T> {
    pub fn new(tree: T) -> Self {
        Self { tree }
    }

    /// Find or create the folder for `month` under `root`.
    pub async fn resolve_month(
        &self,
        root: &RootHandle,
        month: MonthKey,
    ) -> Result<MonthFolder<T::Node>> {
        let root_node = self.tree.open_root(root).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                log::warn!("Root '{}' is not accessible: {}", root, e);
                DaybookError::RootInvalid
            }
            _ => DaybookError::ReadFailed {
                path: root.to_string(),
                source: e,
            },
        })?;

        let name = format_month_key(month);
        let node = self
            .tree
            .find_or_create_dir(&root_node, &name)
            .await
            .map_err(|e| DaybookError::write(name.as_str(), e))?;

        Ok(MonthFolder { month, node })
    }

    /// Text of the entry for `date`, or an empty string when there is none yet.
    pub async fn read_entry(&self, month: &MonthFolder<T::Node>, date: NaiveDate) -> Result<String> {
        let path = naming::entry_path(date);
        let file = self
            .tree
            .find_file(&month.node, &format_entry_file_name(date))
            .await
            .map_err(|e| DaybookError::read(path.as_str(), e))?;

        let Some(file) = file else {
            log::debug!("No entry at {}", path);
            return Ok(String::new());
        };

        let bytes = read_all(&self.tree, &file)
            .await
            .map_err(|e| DaybookError::read(path.as_str(), e))?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                log::warn!("{} is not valid UTF-8; invalid bytes were replaced", path);
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }

    /// Replace the entry for `date` with `text`, creating the file if needed.
    pub async fn write_entry(
        &self,
        month: &MonthFolder<T::Node>,
        date: NaiveDate,
        text: &str,
    ) -> Result<()> {
        let path = naming::entry_path(date);
        let name = format_entry_file_name(date);

        let existing = self
            .tree
            .find_file(&month.node, &name)
            .await
            .map_err(|e| DaybookError::write(path.as_str(), e))?;
        let file = match existing {
            Some(file) => file,
            None => self
                .tree
                .create_file(&month.node, MARKDOWN_MIME, &name)
                .await
                .map_err(|e| DaybookError::write(path.as_str(), e))?,
        };

        write_all(&self.tree, &file, text.as_bytes())
            .await
            .map_err(|e| DaybookError::write(path.as_str(), e))?;

        log::debug!("Wrote {} bytes to {}", text.len(), path);
        Ok(())
    }

    /// Dates with an entry file in `month`. Stray files are ignored.
    pub async fn list_entry_dates(&self, month: &MonthFolder<T::Node>) -> Result<BTreeSet<NaiveDate>> {
        let children = self
            .tree
            .list_children(&month.node)
            .await
            .map_err(|e| DaybookError::read(format_month_key(month.month), e))?;

        Ok(children
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| naming::parse_entry_file_name(&entry.name))
            .collect())
    }

    /// Attachments stored for `month`. Empty when the folder does not exist.
    pub async fn list_attachments(&self, month: &MonthFolder<T::Node>) -> Result<AttachmentIndex> {
        let folder_path = naming::attachment_path(month.month, "");
        let Some(folder) = self
            .tree
            .find_dir(&month.node, ATTACHMENTS_DIR)
            .await
            .map_err(|e| DaybookError::read(folder_path.as_str(), e))?
        else {
            return Ok(AttachmentIndex::new());
        };

        let children = self
            .tree
            .list_children(&folder)
            .await
            .map_err(|e| DaybookError::read(folder_path.as_str(), e))?;

        Ok(children
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .map(|entry| {
                let locator = self.tree.locator(&entry.node);
                (entry.name, locator)
            })
            .collect())
    }

    /// Store a new attachment named `name`, streaming `source` to completion.
    ///
    /// The caller picks a name not yet used in the month. If the copy fails
    /// the half-written file is removed again. Read failures on `source` are
    /// reported as `SourceUnreadable` under `source_name`, whatever their kind.
    pub async fn write_attachment<R>(
        &self,
        month: &MonthFolder<T::Node>,
        name: &str,
        mime_type: &str,
        source_name: &str,
        source: &mut R,
    ) -> Result<u64>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let path = naming::attachment_path(month.month, name);

        let folder = self
            .tree
            .find_or_create_dir(&month.node, ATTACHMENTS_DIR)
            .await
            .map_err(|e| DaybookError::write(path.as_str(), e))?;
        let file = self
            .tree
            .create_file(&folder, mime_type, name)
            .await
            .map_err(|e| DaybookError::write(path.as_str(), e))?;

        match copy_into(&self.tree, &file, source).await {
            Ok(bytes) => {
                log::debug!("Copied {} bytes to {}", bytes, path);
                Ok(bytes)
            }
            Err(e) => {
                if let Err(cleanup) = self.tree.delete(&file).await {
                    log::warn!("Could not remove partial attachment {}: {}", path, cleanup);
                }
                Err(match e {
                    CopyError::Source(source) => DaybookError::SourceUnreadable {
                        source_name: source_name.to_string(),
                        source,
                    },
                    CopyError::Destination(source) => DaybookError::write(path.as_str(), source),
                })
            }
        }
    }
}
