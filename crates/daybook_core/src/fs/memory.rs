//! In-memory document tree.
//!
//! Behaves like a permission-scoped provider: nodes are opaque ids, the root
//! can be revoked at any time, and writes can be made to fail on demand.
//! Clones share the same underlying tree, so a test can keep a handle for
//! assertions while the journal owns another.

use std::collections::HashMap;
use std::io::{Cursor, Error, ErrorKind, Result};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;
use tokio::sync::watch;

use super::{BoxFuture, ByteReader, ByteWriter, DocumentTree, RootHandle, TreeEntry};

const ROOT_ID: u64 = 0;

/// Node reference handed out by [`MemoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryNode(u64);

#[derive(Debug)]
enum Kind {
    Dir,
    File { mime_type: String, bytes: Vec<u8> },
}

#[derive(Debug)]
struct Node {
    parent: Option<u64>,
    name: String,
    kind: Kind,
}

#[derive(Debug)]
struct Inner {
    root_name: String,
    nodes: HashMap<u64, Node>,
    next_id: u64,
    revoked: bool,
    root_error: Option<ErrorKind>,
    fail_writes: bool,
    writes_opened: usize,
}

impl Inner {
    fn check_access(&self) -> Result<()> {
        if self.revoked {
            return Err(Error::new(
                ErrorKind::PermissionDenied,
                "access to the document tree was revoked",
            ));
        }
        Ok(())
    }

    fn child(&self, parent: u64, name: &str) -> Option<(u64, &Node)> {
        self.nodes
            .iter()
            .find(|(_, node)| node.parent == Some(parent) && node.name == name)
            .map(|(id, node)| (*id, node))
    }

    fn dir(&self, id: u64) -> Result<()> {
        match self.nodes.get(&id) {
            Some(Node {
                kind: Kind::Dir, ..
            }) => Ok(()),
            Some(_) => Err(Error::new(ErrorKind::NotADirectory, "not a folder")),
            None => Err(Error::new(ErrorKind::NotFound, "folder not found")),
        }
    }

    fn file_bytes(&mut self, id: u64) -> Result<&mut Vec<u8>> {
        match self.nodes.get_mut(&id) {
            Some(Node {
                kind: Kind::File { bytes, .. },
                ..
            }) => Ok(bytes),
            Some(_) => Err(Error::new(ErrorKind::IsADirectory, "not a file")),
            None => Err(Error::new(ErrorKind::NotFound, "file not found")),
        }
    }

    fn insert(&mut self, parent: u64, name: &str, kind: Kind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                name: name.to_string(),
                kind,
            },
        );
        id
    }

    fn path_of(&self, id: u64) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ROOT_ID {
                break;
            }
            match self.nodes.get(&node_id) {
                Some(node) => {
                    parts.push(node.name.as_str());
                    current = node.parent;
                }
                None => break,
            }
        }
        parts.reverse();
        parts.join("/")
    }

    fn resolve(&self, path: &str) -> Option<u64> {
        let mut current = ROOT_ID;
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = self.child(current, part)?.0;
        }
        Some(current)
    }
}

/// An in-memory, clonable document tree with a single root.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    inner: Arc<Mutex<Inner>>,
    /// True while writers must wait in `open_for_write`.
    write_gate: Arc<watch::Sender<bool>>,
}

impl MemoryTree {
    /// Create an empty tree whose root opens via `RootHandle::new(root_name)`.
    pub fn new(root_name: &str) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID,
            Node {
                parent: None,
                name: String::new(),
                kind: Kind::Dir,
            },
        );
        Self {
            inner: Arc::new(Mutex::new(Inner {
                root_name: root_name.to_string(),
                nodes,
                next_id: ROOT_ID + 1,
                revoked: false,
                root_error: None,
                fail_writes: false,
                writes_opened: 0,
            })),
            write_gate: Arc::new(watch::channel(false).0),
        }
    }

    /// The handle that opens this tree's root.
    pub fn root_handle(&self) -> RootHandle {
        RootHandle::new(self.lock().root_name.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a file at a `/`-separated path, creating folders on the way (builder pattern).
    pub fn with_file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        {
            let mut inner = self.lock();
            let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
            let file_name = parts.pop().unwrap_or_default();
            let mut parent = ROOT_ID;
            for part in parts {
                parent = match inner.child(parent, part) {
                    Some((id, _)) => id,
                    None => inner.insert(parent, part, Kind::Dir),
                };
            }
            let bytes = content.as_ref().to_vec();
            match inner.child(parent, file_name).map(|(id, _)| id) {
                Some(id) => {
                    if let Ok(existing) = inner.file_bytes(id) {
                        *existing = bytes;
                    }
                }
                None => {
                    inner.insert(
                        parent,
                        file_name,
                        Kind::File {
                            mime_type: String::new(),
                            bytes,
                        },
                    );
                }
            }
        }
        self
    }

    /// Content of the file at `path`, if it exists.
    pub fn read_path(&self, path: &str) -> Option<Vec<u8>> {
        let inner = self.lock();
        let id = inner.resolve(path)?;
        match &inner.nodes.get(&id)?.kind {
            Kind::File { bytes, .. } => Some(bytes.clone()),
            Kind::Dir => None,
        }
    }

    /// Content of the file at `path` as UTF-8 text.
    pub fn text_at(&self, path: &str) -> Option<String> {
        self.read_path(path)
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// MIME type recorded when the file at `path` was created.
    pub fn mime_type_at(&self, path: &str) -> Option<String> {
        let inner = self.lock();
        let id = inner.resolve(path)?;
        match &inner.nodes.get(&id)?.kind {
            Kind::File { mime_type, .. } => Some(mime_type.clone()),
            Kind::Dir => None,
        }
    }

    /// Whether anything exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.lock().resolve(path).is_some()
    }

    /// Sorted names of the direct children of the folder at `path` (`""` is the root).
    pub fn names_in(&self, path: &str) -> Vec<String> {
        let inner = self.lock();
        let Some(parent) = inner.resolve(path) else {
            return Vec::new();
        };
        let mut names: Vec<String> = inner
            .nodes
            .values()
            .filter(|node| node.parent == Some(parent))
            .map(|node| node.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Simulate the provider withdrawing access to the root.
    pub fn revoke(&self) {
        self.lock().revoked = true;
    }

    /// Give access back after [`revoke`](Self::revoke).
    pub fn restore(&self) {
        self.lock().revoked = false;
    }

    /// Make opening the root fail with `kind` until cleared with `None`.
    pub fn set_root_error(&self, kind: Option<ErrorKind>) {
        self.lock().root_error = kind;
    }

    /// Make every subsequent stream write fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Park every later `open_for_write` until [`release_writes`](Self::release_writes).
    pub fn hold_writes(&self) {
        self.write_gate.send_replace(true);
    }

    /// Let writers parked by [`hold_writes`](Self::hold_writes) continue.
    pub fn release_writes(&self) {
        self.write_gate.send_replace(false);
    }

    /// Number of times a file was opened for writing.
    pub fn write_count(&self) -> usize {
        self.lock().writes_opened
    }
}

struct MemoryWriter {
    inner: Arc<Mutex<Inner>>,
    node: u64,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize>> {
        let node = self.node;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = inner.check_access() {
            return Poll::Ready(Err(e));
        }
        if inner.fail_writes {
            return Poll::Ready(Err(Error::other("injected write failure")));
        }
        Poll::Ready(inner.file_bytes(node).map(|bytes| {
            bytes.extend_from_slice(buf);
            buf.len()
        }))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl DocumentTree for MemoryTree {
    type Node = MemoryNode;

    fn open_root<'a>(&'a self, root: &'a RootHandle) -> BoxFuture<'a, Result<MemoryNode>> {
        Box::pin(async move {
            let inner = self.lock();
            if root.as_str() != inner.root_name {
                return Err(Error::new(ErrorKind::NotFound, "unknown root"));
            }
            if let Some(kind) = inner.root_error {
                return Err(Error::new(kind, "injected root failure"));
            }
            inner.check_access()?;
            Ok(MemoryNode(ROOT_ID))
        })
    }

    fn find_or_create_dir<'a>(
        &'a self,
        parent: &'a MemoryNode,
        name: &'a str,
    ) -> BoxFuture<'a, Result<MemoryNode>> {
        Box::pin(async move {
            let mut inner = self.lock();
            inner.check_access()?;
            inner.dir(parent.0)?;
            match inner.child(parent.0, name) {
                Some((id, Node { kind: Kind::Dir, .. })) => Ok(MemoryNode(id)),
                Some(_) => Err(Error::new(
                    ErrorKind::AlreadyExists,
                    format!("'{name}' exists and is not a folder"),
                )),
                None => Ok(MemoryNode(inner.insert(parent.0, name, Kind::Dir))),
            }
        })
    }

    fn find_dir<'a>(
        &'a self,
        parent: &'a MemoryNode,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<MemoryNode>>> {
        Box::pin(async move {
            let inner = self.lock();
            inner.check_access()?;
            inner.dir(parent.0)?;
            Ok(match inner.child(parent.0, name) {
                Some((id, Node { kind: Kind::Dir, .. })) => Some(MemoryNode(id)),
                _ => None,
            })
        })
    }

    fn find_file<'a>(
        &'a self,
        parent: &'a MemoryNode,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<MemoryNode>>> {
        Box::pin(async move {
            let inner = self.lock();
            inner.check_access()?;
            inner.dir(parent.0)?;
            Ok(match inner.child(parent.0, name) {
                Some((
                    id,
                    Node {
                        kind: Kind::File { .. },
                        ..
                    },
                )) => Some(MemoryNode(id)),
                _ => None,
            })
        })
    }

    fn create_file<'a>(
        &'a self,
        parent: &'a MemoryNode,
        mime_type: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, Result<MemoryNode>> {
        Box::pin(async move {
            let mut inner = self.lock();
            inner.check_access()?;
            inner.dir(parent.0)?;
            if inner.child(parent.0, name).is_some() {
                return Err(Error::new(
                    ErrorKind::AlreadyExists,
                    format!("'{name}' already exists"),
                ));
            }
            let kind = Kind::File {
                mime_type: mime_type.to_string(),
                bytes: Vec::new(),
            };
            Ok(MemoryNode(inner.insert(parent.0, name, kind)))
        })
    }

    fn list_children<'a>(
        &'a self,
        parent: &'a MemoryNode,
    ) -> BoxFuture<'a, Result<Vec<TreeEntry<MemoryNode>>>> {
        Box::pin(async move {
            let inner = self.lock();
            inner.check_access()?;
            inner.dir(parent.0)?;
            let mut entries: Vec<TreeEntry<MemoryNode>> = inner
                .nodes
                .iter()
                .filter(|(_, node)| node.parent == Some(parent.0))
                .map(|(id, node)| TreeEntry {
                    name: node.name.clone(),
                    node: MemoryNode(*id),
                    is_dir: matches!(node.kind, Kind::Dir),
                })
                .collect();
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entries)
        })
    }

    fn open_for_read<'a>(&'a self, node: &'a MemoryNode) -> BoxFuture<'a, Result<ByteReader>> {
        Box::pin(async move {
            let mut inner = self.lock();
            inner.check_access()?;
            let bytes = inner.file_bytes(node.0)?.clone();
            Ok(Box::new(Cursor::new(bytes)) as ByteReader)
        })
    }

    fn open_for_write<'a>(&'a self, node: &'a MemoryNode) -> BoxFuture<'a, Result<ByteWriter>> {
        Box::pin(async move {
            let mut gate = self.write_gate.subscribe();
            loop {
                let held = *gate.borrow_and_update();
                if !held || gate.changed().await.is_err() {
                    break;
                }
            }

            let mut inner = self.lock();
            inner.check_access()?;
            inner.file_bytes(node.0)?.clear();
            inner.writes_opened += 1;
            Ok(Box::new(MemoryWriter {
                inner: Arc::clone(&self.inner),
                node: node.0,
            }) as ByteWriter)
        })
    }

    fn delete<'a>(&'a self, node: &'a MemoryNode) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut inner = self.lock();
            inner.check_access()?;
            inner.file_bytes(node.0)?;
            inner.nodes.remove(&node.0);
            Ok(())
        })
    }

    fn locator(&self, node: &MemoryNode) -> String {
        let inner = self.lock();
        format!("memory://{}/{}", inner.root_name, inner.path_of(node.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open(tree: &MemoryTree) -> MemoryNode {
        tree.open_root(&tree.root_handle()).await.unwrap()
    }

    #[tokio::test]
    async fn find_or_create_dir_is_idempotent() {
        let tree = MemoryTree::new("journal");
        let root = open(&tree).await;

        let first = tree.find_or_create_dir(&root, "2026-01").await.unwrap();
        let second = tree.find_or_create_dir(&root, "2026-01").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(tree.names_in(""), vec!["2026-01"]);
    }

    #[tokio::test]
    async fn create_file_refuses_existing_names() {
        let tree = MemoryTree::new("journal");
        let root = open(&tree).await;

        tree.create_file(&root, "text/plain", "a.txt").await.unwrap();
        let err = tree
            .create_file(&root, "text/plain", "a.txt")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(tree.mime_type_at("a.txt").as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn revoked_root_reports_permission_denied() {
        let tree = MemoryTree::new("journal");
        let root = open(&tree).await;
        tree.revoke();

        let err = tree.open_root(&tree.root_handle()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        let err = tree.list_children(&root).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        tree.restore();
        assert!(tree.list_children(&root).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn held_writes_wait_for_release() {
        let tree = MemoryTree::new("journal");
        let root = open(&tree).await;
        let file = tree.create_file(&root, "text/plain", "a.txt").await.unwrap();
        tree.hold_writes();

        let writer = {
            let tree = tree.clone();
            tokio::spawn(async move { tree.open_for_write(&file).await.map(|_| ()) })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!writer.is_finished());
        assert_eq!(tree.write_count(), 0);

        tree.release_writes();
        writer.await.unwrap().unwrap();
        assert_eq!(tree.write_count(), 1);
    }

    #[tokio::test]
    async fn unknown_root_is_not_found() {
        let tree = MemoryTree::new("journal");
        let err = tree
            .open_root(&RootHandle::new("elsewhere"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn seeded_files_are_listed_and_located() {
        let tree = MemoryTree::new("journal").with_file("2026-01/attachments/cat.png", b"png");
        let root = open(&tree).await;
        let month = tree.find_dir(&root, "2026-01").await.unwrap().unwrap();
        let attachments = tree.find_dir(&month, "attachments").await.unwrap().unwrap();

        let children = tree.list_children(&attachments).await.unwrap();
        assert_eq!(children.len(), 1);
        assert!(!children[0].is_dir);
        assert_eq!(
            tree.locator(&children[0].node),
            "memory://journal/2026-01/attachments/cat.png"
        );
    }
}
