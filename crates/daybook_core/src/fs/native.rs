//! Native document tree implementation.
//!
//! Nodes are plain paths below a root directory. All I/O goes through
//! `tokio::fs`, which runs the blocking calls on tokio's blocking pool.
//! Only available on non-WASM targets.

use std::io::{Error, ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use url::Url;

use super::{BoxFuture, ByteReader, ByteWriter, DocumentTree, RootHandle, TreeEntry};

#[derive(Debug, Clone, Copy, Default)]
/// Maps the document tree onto a directory on the local filesystem.
///
/// The root handle is the directory path.
pub struct NativeTree;

/// Child names must be a single normal path component.
fn child_path(parent: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(parent.join(name)),
        _ => Err(Error::new(
            ErrorKind::InvalidInput,
            format!("'{name}' is not a valid child name"),
        )),
    }
}

async fn kind_of(path: &Path) -> Result<Option<bool>> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.is_dir())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

impl DocumentTree for NativeTree {
    type Node = PathBuf;

    fn open_root<'a>(&'a self, root: &'a RootHandle) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            let path = PathBuf::from(root.as_str());
            if kind_of(&path).await? != Some(true) {
                return Err(Error::new(
                    ErrorKind::NotFound,
                    format!("root folder not found: {}", path.display()),
                ));
            }
            // Listing proves the directory is still readable.
            fs::read_dir(&path).await?;
            Ok(path)
        })
    }

    fn find_or_create_dir<'a>(
        &'a self,
        parent: &'a PathBuf,
        name: &'a str,
    ) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            let path = child_path(parent, name)?;
            match kind_of(&path).await? {
                Some(true) => return Ok(path),
                Some(false) => {
                    return Err(Error::new(
                        ErrorKind::AlreadyExists,
                        format!("'{name}' exists and is not a folder"),
                    ));
                }
                None => {}
            }
            match fs::create_dir(&path).await {
                Ok(()) => Ok(path),
                // Lost a race with another caller creating the same folder.
                Err(e) if e.kind() == ErrorKind::AlreadyExists => match kind_of(&path).await? {
                    Some(true) => Ok(path),
                    _ => Err(e),
                },
                Err(e) => Err(e),
            }
        })
    }

    fn find_dir<'a>(
        &'a self,
        parent: &'a PathBuf,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<PathBuf>>> {
        Box::pin(async move {
            let path = child_path(parent, name)?;
            Ok((kind_of(&path).await? == Some(true)).then_some(path))
        })
    }

    fn find_file<'a>(
        &'a self,
        parent: &'a PathBuf,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<PathBuf>>> {
        Box::pin(async move {
            let path = child_path(parent, name)?;
            Ok((kind_of(&path).await? == Some(false)).then_some(path))
        })
    }

    fn create_file<'a>(
        &'a self,
        parent: &'a PathBuf,
        _mime_type: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<PathBuf>> {
        Box::pin(async move {
            let path = child_path(parent, name)?;
            // create_new is atomic, so two creators cannot both succeed
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await?;
            Ok(path)
        })
    }

    fn list_children<'a>(
        &'a self,
        parent: &'a PathBuf,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry<PathBuf>>>> {
        Box::pin(async move {
            let mut entries = Vec::new();
            let mut dir = fs::read_dir(parent).await?;
            while let Some(entry) = dir.next_entry().await? {
                let Ok(name) = entry.file_name().into_string() else {
                    log::debug!("Skipping non UTF-8 name in {}", parent.display());
                    continue;
                };
                let is_dir = entry.file_type().await?.is_dir();
                entries.push(TreeEntry {
                    name,
                    node: entry.path(),
                    is_dir,
                });
            }
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entries)
        })
    }

    fn open_for_read<'a>(&'a self, node: &'a PathBuf) -> BoxFuture<'a, Result<ByteReader>> {
        Box::pin(async move {
            let file = fs::File::open(node).await?;
            Ok(Box::new(file) as ByteReader)
        })
    }

    fn open_for_write<'a>(&'a self, node: &'a PathBuf) -> BoxFuture<'a, Result<ByteWriter>> {
        Box::pin(async move {
            let file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(node)
                .await?;
            Ok(Box::new(file) as ByteWriter)
        })
    }

    fn delete<'a>(&'a self, node: &'a PathBuf) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { fs::remove_file(node).await })
    }

    fn locator(&self, node: &PathBuf) -> String {
        let absolute = std::path::absolute(node).unwrap_or_else(|_| node.clone());
        Url::from_file_path(&absolute)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| absolute.display().to_string())
    }
}
