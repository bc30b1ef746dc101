//! Blocking facade over [`FileSystem`].
//!
//! Each method drives the corresponding async method to completion on a
//! private current-thread runtime. There is no separate implementation and
//! no extra error wrapping. Do not call these from inside a tokio runtime:
//! `block_on` panics there.

use std::io;

use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

use crate::adapter::{Adapter, FileStream};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::models::{DirectoryModel, EntryModel, FileModel};

/// Synchronous wrapper around a [`FileSystem`].
#[derive(Debug)]
pub struct BlockingFileSystem {
    inner: FileSystem,
    runtime: Runtime,
}

impl BlockingFileSystem {
    pub fn new(inner: FileSystem) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { inner, runtime })
    }

    pub fn inner(&self) -> &FileSystem {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut FileSystem {
        &mut self.inner
    }

    pub fn into_inner(self) -> FileSystem {
        self.inner
    }

    pub fn add_adapter(&mut self, adapter: impl Adapter + 'static) {
        self.inner.add_adapter(adapter);
    }

    pub fn get_file(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<FileModel> {
        self.runtime.block_on(self.inner.get_file(virtual_path, cancel))
    }

    pub fn get_directory(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<DirectoryModel> {
        self.runtime
            .block_on(self.inner.get_directory(virtual_path, cancel))
    }

    pub fn list_files(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<Vec<FileModel>> {
        self.runtime.block_on(self.inner.list_files(virtual_path, cancel))
    }

    pub fn list_directories(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DirectoryModel>> {
        self.runtime
            .block_on(self.inner.list_directories(virtual_path, cancel))
    }

    pub fn list_entries(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntryModel>> {
        self.runtime
            .block_on(self.inner.list_entries(virtual_path, cancel))
    }

    pub fn file_exists(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<bool> {
        self.runtime.block_on(self.inner.file_exists(virtual_path, cancel))
    }

    pub fn directory_exists(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<bool> {
        self.runtime
            .block_on(self.inner.directory_exists(virtual_path, cancel))
    }

    pub fn create_directory(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<()> {
        self.runtime
            .block_on(self.inner.create_directory(virtual_path, cancel))
    }

    pub fn delete_file(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<()> {
        self.runtime.block_on(self.inner.delete_file(virtual_path, cancel))
    }

    pub fn delete_directory(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<()> {
        self.runtime
            .block_on(self.inner.delete_directory(virtual_path, cancel))
    }

    pub fn read_file(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        self.runtime.block_on(self.inner.read_file(virtual_path, cancel))
    }

    /// The stream itself is async; poll it from a runtime of your own.
    pub fn read_file_stream(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<FileStream> {
        self.runtime
            .block_on(self.inner.read_file_stream(virtual_path, cancel))
    }

    pub fn read_text_file(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<String> {
        self.runtime
            .block_on(self.inner.read_text_file(virtual_path, cancel))
    }

    pub fn write_file(
        &self,
        virtual_path: &str,
        contents: &[u8],
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.write_file(virtual_path, contents, overwrite, cancel))
    }

    pub fn write_text_file(
        &self,
        virtual_path: &str,
        contents: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.write_text_file(virtual_path, contents, overwrite, cancel))
    }

    pub fn append_file(
        &self,
        virtual_path: &str,
        contents: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.append_file(virtual_path, contents, cancel))
    }

    pub fn append_text_file(
        &self,
        virtual_path: &str,
        contents: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.append_text_file(virtual_path, contents, cancel))
    }

    pub fn copy_file(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.copy_file(source, destination, overwrite, cancel))
    }

    pub fn move_file(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.move_file(source, destination, overwrite, cancel))
    }
}
