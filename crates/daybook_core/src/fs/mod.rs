//! Document tree abstraction.
//!
//! The journal never sees paths. It walks an opaque tree of folders and files
//! reached from a [`RootHandle`] the user granted, the same way a
//! permission-scoped document provider hands out node references. The
//! [`DocumentTree`] trait is that capability surface; everything above it
//! (the store, ingest, autosave) is written against the trait only.
//!
//! Two implementations ship with the crate:
//!
//! - [`NativeTree`]: std paths, I/O on tokio's blocking pool
//! - [`MemoryTree`]: in-memory tree with failure injection, for tests and
//!   embedding
//!
//! ## Object safety
//!
//! All methods return boxed futures so implementations can be used from
//! spawned tasks on multi-threaded runtimes.

pub(crate) mod async_fs;
mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod native;

pub use async_fs::{BoxFuture, ByteReader, ByteWriter};
pub use memory::{MemoryNode, MemoryTree};
#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeTree;

use std::fmt;
use std::io::Result;

use serde::{Deserialize, Serialize};

/// Opaque reference to the storage root the user picked.
///
/// Its meaning belongs to the [`DocumentTree`] that opens it: a directory
/// path for [`NativeTree`], a tree name for [`MemoryTree`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootHandle(String);

impl RootHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RootHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A direct child returned by [`DocumentTree::list_children`].
#[derive(Debug, Clone)]
pub struct TreeEntry<N> {
    pub name: String,
    pub node: N,
    pub is_dir: bool,
}

/// Capability interface over a permission-scoped document tree.
///
/// Errors are plain `std::io::Error`s. Implementations report a root that no
/// longer grants access with `ErrorKind::PermissionDenied` (or `NotFound`
/// from [`open_root`](DocumentTree::open_root)); the store turns those into
/// `DaybookError::RootInvalid`.
pub trait DocumentTree: Send + Sync {
    /// Node reference handed out by this tree.
    type Node: Clone + fmt::Debug + Send + Sync + 'static;

    /// Resolve the root handle, checking that it still grants access.
    fn open_root<'a>(&'a self, root: &'a RootHandle) -> BoxFuture<'a, Result<Self::Node>>;

    /// Find the child folder `name`, creating it when absent.
    ///
    /// Must be idempotent: concurrent callers end up with the same folder.
    fn find_or_create_dir<'a>(
        &'a self,
        parent: &'a Self::Node,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Self::Node>>;

    /// Find the child folder `name` without creating it.
    fn find_dir<'a>(
        &'a self,
        parent: &'a Self::Node,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Self::Node>>>;

    /// Find the child file `name`.
    fn find_file<'a>(
        &'a self,
        parent: &'a Self::Node,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Self::Node>>>;

    /// Create an empty file. Errors with `AlreadyExists` if `name` is taken.
    fn create_file<'a>(
        &'a self,
        parent: &'a Self::Node,
        mime_type: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Self::Node>>;

    /// List direct children of a folder.
    fn list_children<'a>(
        &'a self,
        parent: &'a Self::Node,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry<Self::Node>>>>;

    /// Open a file for streaming reads.
    fn open_for_read<'a>(&'a self, node: &'a Self::Node) -> BoxFuture<'a, Result<ByteReader>>;

    /// Open a file for writing, truncating existing content.
    fn open_for_write<'a>(&'a self, node: &'a Self::Node) -> BoxFuture<'a, Result<ByteWriter>>;

    /// Remove a file.
    fn delete<'a>(&'a self, node: &'a Self::Node) -> BoxFuture<'a, Result<()>>;

    /// A renderer-usable locator for a file node.
    fn locator(&self, node: &Self::Node) -> String;
}

// Blanket implementation for references to DocumentTree
impl<T: DocumentTree + ?Sized> DocumentTree for &T {
    type Node = T::Node;

    fn open_root<'a>(&'a self, root: &'a RootHandle) -> BoxFuture<'a, Result<Self::Node>> {
        (**self).open_root(root)
    }

    fn find_or_create_dir<'a>(
        &'a self,
        parent: &'a Self::Node,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Self::Node>> {
        (**self).find_or_create_dir(parent, name)
    }

    fn find_dir<'a>(
        &'a self,
        parent: &'a Self::Node,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Self::Node>>> {
        (**self).find_dir(parent, name)
    }

    fn find_file<'a>(
        &'a self,
        parent: &'a Self::Node,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Self::Node>>> {
        (**self).find_file(parent, name)
    }

    fn create_file<'a>(
        &'a self,
        parent: &'a Self::Node,
        mime_type: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Self::Node>> {
        (**self).create_file(parent, mime_type, name)
    }

    fn list_children<'a>(
        &'a self,
        parent: &'a Self::Node,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry<Self::Node>>>> {
        (**self).list_children(parent)
    }

    fn open_for_read<'a>(&'a self, node: &'a Self::Node) -> BoxFuture<'a, Result<ByteReader>> {
        (**self).open_for_read(node)
    }

    fn open_for_write<'a>(&'a self, node: &'a Self::Node) -> BoxFuture<'a, Result<ByteWriter>> {
        (**self).open_for_write(node)
    }

    fn delete<'a>(&'a self, node: &'a Self::Node) -> BoxFuture<'a, Result<()>> {
        (**self).delete(node)
    }

    fn locator(&self, node: &Self::Node) -> String {
        (**self).locator(node)
    }
}
