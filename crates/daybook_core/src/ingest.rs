//! Copying user-picked files into a month's attachments folder.
//!
//! Each source is handled on its own: a source that cannot be read or
//! written is logged and skipped, and the rest of the batch carries on. The
//! returned list only contains what was actually stored.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{DaybookError, Result};
use crate::fs::{BoxFuture, ByteReader, DocumentTree};
use crate::naming::{self, DEFAULT_MIME, PLACEHOLDER_NAME};
use crate::store::{DocumentStore, MonthFolder};

/// Something the user picked to attach.
pub trait AttachmentSource: Send + Sync {
    /// Human-readable name reported by the source, if any.
    fn display_name(&self) -> Option<String>;

    /// MIME type reported by the source, if any.
    fn mime_type(&self) -> Option<String>;

    /// Open the source's bytes for streaming.
    fn open(&self) -> BoxFuture<'_, io::Result<ByteReader>>;

    /// Short description for log messages.
    fn describe(&self) -> String {
        self.display_name()
            .unwrap_or_else(|| PLACEHOLDER_NAME.to_string())
    }
}

impl<S: AttachmentSource + ?Sized> AttachmentSource for Box<S> {
    fn display_name(&self) -> Option<String> {
        (**self).display_name()
    }

    fn mime_type(&self) -> Option<String> {
        (**self).mime_type()
    }

    fn open(&self) -> BoxFuture<'_, io::Result<ByteReader>> {
        (**self).open()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// An attachment that made it into storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopiedAttachment {
    /// Stored file name inside `attachments/`
    pub name: String,
    /// Whether the source's MIME type was `image/*`
    pub is_image: bool,
}

/// A file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AttachmentSource for FileSource {
    fn display_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn mime_type(&self) -> Option<String> {
        let name = self.display_name()?;
        naming::mime_for_name(&name).map(str::to_string)
    }

    fn open(&self) -> BoxFuture<'_, io::Result<ByteReader>> {
        Box::pin(async move {
            let file = tokio::fs::File::open(&self.path).await?;
            Ok(Box::new(file) as ByteReader)
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Bytes already in memory, e.g. pasted from a clipboard.
#[derive(Debug, Clone, Default)]
pub struct BytesSource {
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl BytesSource {
    pub fn new(name: &str, mime_type: &str, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: Some(name.to_string()),
            mime_type: Some(mime_type.to_string()),
            bytes: bytes.into(),
        }
    }
}

impl AttachmentSource for BytesSource {
    fn display_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn mime_type(&self) -> Option<String> {
        self.mime_type.clone()
    }

    fn open(&self) -> BoxFuture<'_, io::Result<ByteReader>> {
        let bytes = self.bytes.clone();
        Box::pin(async move { Ok(Box::new(io::Cursor::new(bytes)) as ByteReader) })
    }
}

/// Copy every source into `month`'s attachments folder.
///
/// Names are computed against one listing taken at the start of the batch;
/// names handed out earlier in the same batch count as taken too. Returns
/// `RootInvalid` as soon as the root stops granting access; any other
/// per-source failure only drops that source.
pub async fn ingest<T, S>(
    store: &DocumentStore<T>,
    month: &MonthFolder<T::Node>,
    sources: &[S],
    now: NaiveDateTime,
) -> Result<Vec<CopiedAttachment>>
where
    T: DocumentTree,
    S: AttachmentSource,
{
    let mut taken: HashSet<String> = store.list_attachments(month).await?.into_keys().collect();
    let mut copied = Vec::with_capacity(sources.len());

    for source in sources {
        match ingest_one(store, month, source, now, &taken).await {
            Ok(attachment) => {
                log::info!(
                    "Attached {} as {}",
                    source.describe(),
                    naming::attachment_path(month.month, &attachment.name)
                );
                taken.insert(attachment.name.clone());
                copied.push(attachment);
            }
            Err(e) if e.is_root_invalid() => return Err(e),
            Err(e) => log::warn!("Skipping attachment {}: {}", source.describe(), e),
        }
    }

    Ok(copied)
}

async fn ingest_one<T, S>(
    store: &DocumentStore<T>,
    month: &MonthFolder<T::Node>,
    source: &S,
    now: NaiveDateTime,
    taken: &HashSet<String>,
) -> Result<CopiedAttachment>
where
    T: DocumentTree,
    S: AttachmentSource,
{
    let display_name = source
        .display_name()
        .unwrap_or_else(|| PLACEHOLDER_NAME.to_string());
    let mime_type = source
        .mime_type()
        .filter(|mime| !mime.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MIME.to_string());

    let name = naming::attachment_name(&display_name, now, |candidate| {
        taken.contains(candidate)
    });

    let mut reader = source
        .open()
        .await
        .map_err(|e| DaybookError::SourceUnreadable {
            source_name: source.describe(),
            source: e,
        })?;

    store
        .write_attachment(month, &name, &mime_type, &source.describe(), &mut reader)
        .await?;

    Ok(CopiedAttachment {
        is_image: naming::is_image_mime(&mime_type),
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryTree;
    use crate::test_utils::{DeniedSource, UnreadableSource, at, month};

    async fn setup(tree: &MemoryTree) -> (DocumentStore<MemoryTree>, MonthFolder<crate::fs::MemoryNode>) {
        let store = DocumentStore::new(tree.clone());
        let folder = store
            .resolve_month(&tree.root_handle(), month(2026, 1))
            .await
            .unwrap();
        (store, folder)
    }

    #[tokio::test]
    async fn ingest_names_and_classifies_sources() {
        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        let sources = [
            BytesSource::new("cat.png", "image/png", b"png".to_vec()),
            BytesSource::new("notes.pdf", "application/pdf", b"pdf".to_vec()),
        ];

        let copied = ingest(&store, &folder, &sources, at(2026, 1, 16, 9, 5, 2))
            .await
            .unwrap();

        assert_eq!(
            copied,
            vec![
                CopiedAttachment {
                    name: "2026-01-16_090502_cat.png".to_string(),
                    is_image: true,
                },
                CopiedAttachment {
                    name: "2026-01-16_090502_notes.pdf".to_string(),
                    is_image: false,
                },
            ]
        );
        assert_eq!(
            tree.mime_type_at("2026-01/attachments/2026-01-16_090502_cat.png")
                .as_deref(),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn same_second_same_name_gets_distinct_names() {
        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        let now = at(2026, 1, 16, 9, 5, 2);
        let sources = [
            BytesSource::new("cat.png", "image/png", b"one".to_vec()),
            BytesSource::new("cat.png", "image/png", b"two".to_vec()),
        ];

        let copied = ingest(&store, &folder, &sources, now).await.unwrap();

        assert_eq!(copied.len(), 2);
        assert_ne!(copied[0].name, copied[1].name);
        let listed = store.list_attachments(&folder).await.unwrap();
        assert!(listed.contains_key(&copied[0].name));
        assert!(listed.contains_key(&copied[1].name));
    }

    #[tokio::test]
    async fn collision_with_earlier_batch_uses_suffix() {
        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        let now = at(2026, 1, 16, 9, 5, 2);

        let first = ingest(&store, &folder, &[BytesSource::new("a.txt", "text/plain", "1")], now)
            .await
            .unwrap();
        let second = ingest(&store, &folder, &[BytesSource::new("a.txt", "text/plain", "2")], now)
            .await
            .unwrap();

        assert_eq!(first[0].name, "2026-01-16_090502_a.txt");
        assert!(second[0].name.starts_with("2026-01-16_090502_a_"));
        assert_eq!(
            tree.text_at("2026-01/attachments/2026-01-16_090502_a.txt").as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn missing_metadata_uses_fallbacks() {
        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        let source = BytesSource {
            name: None,
            mime_type: None,
            bytes: b"?".to_vec(),
        };

        let copied = ingest(&store, &folder, &[source], at(2026, 1, 16, 0, 0, 1))
            .await
            .unwrap();

        assert_eq!(copied[0].name, "2026-01-16_000001_attachment");
        assert!(!copied[0].is_image);
        assert_eq!(
            tree.mime_type_at("2026-01/attachments/2026-01-16_000001_attachment")
                .as_deref(),
            Some(DEFAULT_MIME)
        );
    }

    #[tokio::test]
    async fn unreadable_source_is_skipped() {
        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        let sources: Vec<Box<dyn AttachmentSource>> = vec![
            Box::new(UnreadableSource),
            Box::new(BytesSource::new("ok.png", "image/png", b"ok".to_vec())),
        ];

        let copied = ingest(&store, &folder, &sources, at(2026, 1, 16, 9, 0, 0))
            .await
            .unwrap();

        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].name, "2026-01-16_090000_ok.png");
        assert_eq!(tree.names_in("2026-01/attachments").len(), 1);
    }

    #[tokio::test]
    async fn source_denied_mid_read_is_skipped_not_root_invalid() {
        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        let sources: Vec<Box<dyn AttachmentSource>> = vec![
            Box::new(DeniedSource),
            Box::new(BytesSource::new("ok.png", "image/png", b"ok".to_vec())),
        ];

        let copied = ingest(&store, &folder, &sources, at(2026, 1, 16, 9, 0, 0))
            .await
            .unwrap();

        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].name, "2026-01-16_090000_ok.png");
        assert_eq!(
            tree.names_in("2026-01/attachments"),
            vec!["2026-01-16_090000_ok.png"]
        );
    }

    #[tokio::test]
    async fn write_failures_are_skipped_without_leftovers() {
        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        tree.set_fail_writes(true);

        let copied = ingest(
            &store,
            &folder,
            &[BytesSource::new("a.png", "image/png", b"a".to_vec())],
            at(2026, 1, 16, 9, 0, 0),
        )
        .await
        .unwrap();

        assert!(copied.is_empty());
        assert!(tree.names_in("2026-01/attachments").is_empty());
    }

    #[tokio::test]
    async fn revoked_root_fails_the_batch() {
        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        tree.revoke();

        let err = ingest(
            &store,
            &folder,
            &[BytesSource::new("a.png", "image/png", b"a".to_vec())],
            at(2026, 1, 16, 9, 0, 0),
        )
        .await
        .unwrap_err();

        assert!(err.is_root_invalid());
    }

    #[tokio::test]
    async fn file_source_infers_mime_from_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("Holiday Photo.JPG");
        std::fs::write(&path, b"jpeg").unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.display_name().as_deref(), Some("Holiday Photo.JPG"));
        assert_eq!(source.mime_type().as_deref(), Some("image/jpeg"));

        let tree = MemoryTree::new("journal");
        let (store, folder) = setup(&tree).await;
        let copied = ingest(&store, &folder, &[source], at(2026, 1, 16, 9, 0, 0))
            .await
            .unwrap();
        assert_eq!(copied[0].name, "2026-01-16_090000_Holiday Photo.JPG");
        assert!(copied[0].is_image);
    }
}
