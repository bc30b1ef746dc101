//! Shared test adapters.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use unifs_core::{
    Adapter, CancellationToken, DirectoryModel, FileModel, FsError, MemoryAdapter, Result,
};

/// Wraps a `MemoryAdapter`, counting connects and optionally failing deletes.
pub struct InstrumentedAdapter {
    inner: MemoryAdapter,
    pub connects: AtomicUsize,
    fail_deletes: bool,
}

impl InstrumentedAdapter {
    pub fn new(prefix: &str) -> Self {
        Self {
            inner: MemoryAdapter::new(prefix),
            connects: AtomicUsize::new(0),
            fail_deletes: false,
        }
    }

    pub fn failing_deletes(prefix: &str) -> Self {
        Self {
            fail_deletes: true,
            ..Self::new(prefix)
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adapter for InstrumentedAdapter {
    fn prefix(&self) -> &str {
        self.inner.prefix()
    }

    fn root_path(&self) -> &str {
        self.inner.root_path()
    }

    async fn connect(&self, cancel: &CancellationToken) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.inner.connect(cancel).await
    }

    async fn get_file(&self, path: &str, cancel: &CancellationToken) -> Result<FileModel> {
        self.inner.get_file(path, cancel).await
    }

    async fn get_directory(&self, path: &str, cancel: &CancellationToken) -> Result<DirectoryModel> {
        self.inner.get_directory(path, cancel).await
    }

    async fn list_files(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<FileModel>> {
        self.inner.list_files(path, cancel).await
    }

    async fn list_directories(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DirectoryModel>> {
        self.inner.list_directories(path, cancel).await
    }

    async fn create_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        self.inner.create_directory(path, cancel).await
    }

    async fn delete_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        self.inner.delete_directory(path, cancel).await
    }

    async fn delete_file(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        if self.fail_deletes {
            return Err(FsError::runtime(
                self.prefix(),
                io::Error::new(io::ErrorKind::PermissionDenied, "object is locked"),
            ));
        }
        self.inner.delete_file(path, cancel).await
    }

    async fn read_file(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        self.inner.read_file(path, cancel).await
    }

    async fn write_file(
        &self,
        path: &str,
        contents: &[u8],
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.inner.write_file(path, contents, overwrite, cancel).await
    }

    async fn append_file(&self, path: &str, contents: &[u8], cancel: &CancellationToken) -> Result<()> {
        self.inner.append_file(path, contents, cancel).await
    }
}
