//! Future and stream types shared by [`DocumentTree`](super::DocumentTree)
//! implementations, plus the streaming helpers the store builds on.
//!
//! Streams are tokio's `AsyncRead`/`AsyncWrite`, so a native implementation
//! can hand out `tokio::fs::File`s (which run on the blocking pool) and the
//! in-memory tree can hand out plain buffers.

use std::future::Future;
use std::io::{Error, Result};
use std::pin::Pin;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::DocumentTree;

/// A boxed future for object-safe async methods.
///
/// Futures are `Send` for compatibility with multi-threaded runtimes.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Readable byte stream over a file node.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Writable byte stream over a file node.
pub type ByteWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Read a whole file node into memory.
pub(crate) async fn read_all<T: DocumentTree + ?Sized>(
    tree: &T,
    node: &T::Node,
) -> Result<Vec<u8>> {
    let mut reader = tree.open_for_read(node).await?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Ok(bytes)
}

/// Replace a file node's content with `bytes`.
pub(crate) async fn write_all<T: DocumentTree + ?Sized>(
    tree: &T,
    node: &T::Node,
    bytes: &[u8],
) -> Result<()> {
    let mut writer = tree.open_for_write(node).await?;
    writer.write_all(bytes).await?;
    writer.shutdown().await
}

/// Which side of a [`copy_into`] failed.
#[derive(Debug)]
pub(crate) enum CopyError {
    /// Reading the source stream failed
    Source(Error),
    /// Opening or writing the destination node failed
    Destination(Error),
}

const COPY_CHUNK: usize = 64 * 1024;

/// Stream `source` into a file node until EOF. Returns the byte count.
pub(crate) async fn copy_into<T, R>(
    tree: &T,
    node: &T::Node,
    source: &mut R,
) -> std::result::Result<u64, CopyError>
where
    T: DocumentTree + ?Sized,
    R: AsyncRead + Unpin + Send + ?Sized,
{
    let mut writer = tree
        .open_for_write(node)
        .await
        .map_err(CopyError::Destination)?;
    let mut buffer = vec![0u8; COPY_CHUNK];
    let mut copied = 0u64;
    loop {
        let read = source
            .read(&mut buffer)
            .await
            .map_err(CopyError::Source)?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .await
            .map_err(CopyError::Destination)?;
        copied += read as u64;
    }
    writer.shutdown().await.map_err(CopyError::Destination)?;
    Ok(copied)
}
