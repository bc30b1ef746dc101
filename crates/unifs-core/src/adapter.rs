//! The adapter contract every storage backend implements.
//!
//! Adapters receive paths relative to their own root (the part after
//! `prefix://`) and return descriptors whose `virtual_path` points back into
//! the virtual namespace. Every failure leaving an adapter is an [`FsError`];
//! adapters run their native errors through [`Classify`](crate::Classify)
//! at each operation boundary.
//!
//! Behavior that must be identical across backends lives in free functions
//! here ([`file_exists`], [`directory_exists`], [`ensure_writable`],
//! [`ensure_file`], [`ensure_directory`]) rather than in overridable trait
//! methods.

use std::future::Future;
use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::error::{FsError, Result};
use crate::models::{DirectoryModel, FileModel};

/// Readable stream over a file's contents.
pub type FileStream = Pin<Box<dyn AsyncRead + Send>>;

/// A storage backend addressed by a prefix.
///
/// Implementations must be safe to share between concurrent operations;
/// the dispatcher hands out `Arc<dyn Adapter>` and never serializes calls.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Prefix selecting this adapter in a virtual path.
    fn prefix(&self) -> &str;

    /// Normalized root path all relative paths are resolved under.
    fn root_path(&self) -> &str;

    /// Establish the backend connection. Calling it again once connected is
    /// a no-op.
    async fn connect(&self, cancel: &CancellationToken) -> Result<()>;

    /// Look up a file. Fails with `FileNotFound` if absent.
    async fn get_file(&self, path: &str, cancel: &CancellationToken) -> Result<FileModel>;

    /// Look up a directory. Fails with `DirectoryNotFound` if absent.
    async fn get_directory(&self, path: &str, cancel: &CancellationToken)
    -> Result<DirectoryModel>;

    /// Files directly inside `path`, sorted by name.
    async fn list_files(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<FileModel>>;

    /// Directories directly inside `path`, sorted by name.
    async fn list_directories(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DirectoryModel>>;

    /// Create a directory (and missing parents). Fails with
    /// `DirectoryExists` if it is already there.
    async fn create_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()>;

    /// Delete a directory and everything below it.
    async fn delete_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()>;

    async fn delete_file(&self, path: &str, cancel: &CancellationToken) -> Result<()>;

    async fn read_file(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<u8>>;

    /// Stream a file's contents.
    ///
    /// The default buffers the whole file through [`Adapter::read_file`];
    /// backends with native streaming should override it.
    async fn read_file_stream(&self, path: &str, cancel: &CancellationToken) -> Result<FileStream> {
        let contents = self.read_file(path, cancel).await?;
        let stream: FileStream = Box::pin(io::Cursor::new(contents));
        Ok(stream)
    }

    /// Write a file, replacing any existing content.
    ///
    /// Must call [`ensure_writable`] before touching the backend so an
    /// existing file with `overwrite == false` fails with `FileExists` and
    /// is left intact.
    async fn write_file(
        &self,
        path: &str,
        contents: &[u8],
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Append to an existing file. Must call [`ensure_file`] first.
    async fn append_file(
        &self,
        path: &str,
        contents: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// `true` if `get_file` succeeds, `false` on `FileNotFound`. Any other
/// error is returned unchanged.
pub async fn file_exists(
    adapter: &dyn Adapter,
    path: &str,
    cancel: &CancellationToken,
) -> Result<bool> {
    match adapter.get_file(path, cancel).await {
        Ok(_) => Ok(true),
        Err(FsError::FileNotFound { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// `true` if `get_directory` succeeds, `false` on `DirectoryNotFound`.
pub async fn directory_exists(
    adapter: &dyn Adapter,
    path: &str,
    cancel: &CancellationToken,
) -> Result<bool> {
    match adapter.get_directory(path, cancel).await {
        Ok(_) => Ok(true),
        Err(FsError::DirectoryNotFound { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Write precondition: an existing file may only be replaced with
/// `overwrite`.
pub async fn ensure_writable(
    adapter: &dyn Adapter,
    path: &str,
    overwrite: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    if !overwrite && file_exists(adapter, path, cancel).await? {
        return Err(FsError::file_exists(adapter.prefix(), path));
    }
    Ok(())
}

/// Append precondition: the file must already exist.
pub async fn ensure_file(
    adapter: &dyn Adapter,
    path: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    if !file_exists(adapter, path, cancel).await? {
        return Err(FsError::file_not_found(adapter.prefix(), path));
    }
    Ok(())
}

/// Listing precondition: the directory must exist.
pub async fn ensure_directory(
    adapter: &dyn Adapter,
    path: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    if !directory_exists(adapter, path, cancel).await? {
        return Err(FsError::directory_not_found(adapter.prefix(), path));
    }
    Ok(())
}

/// Native error produced when a backend call is cancelled.
#[derive(Debug, Clone, Copy, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

impl From<Cancelled> for io::Error {
    fn from(cancelled: Cancelled) -> Self {
        io::Error::new(io::ErrorKind::Interrupted, cancelled)
    }
}

/// Race a native backend call against `cancel`.
///
/// The cancellation surfaces as the backend's own error type so it goes
/// through the same classification as every other native failure.
pub async fn cancellable<F, T, E>(cancel: &CancellationToken, fut: F) -> std::result::Result<T, E>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: From<Cancelled>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled.into()),
        result = fut => result,
    }
}
