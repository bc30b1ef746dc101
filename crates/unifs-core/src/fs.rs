//! Registry of adapters and the virtual-path dispatcher.
//!
//! `FileSystem` owns an ordered list of adapters. Every operation parses the
//! virtual path, validates the registry, looks the adapter up by prefix,
//! connects it and delegates the relative path. Results and errors come back
//! from the adapter unchanged.
//!
//! Validation is repeated on every call. Mutating the registry while
//! operations are in flight is the caller's problem; there is no internal
//! locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapter::{self, Adapter, FileStream};
use crate::error::{FsError, Result};
use crate::models::{DirectoryModel, EntryModel, FileModel};
use crate::path;

/// Dispatches virtual-path operations to registered adapters.
#[derive(Default, Clone)]
pub struct FileSystem {
    adapters: Vec<Arc<dyn Adapter>>,
}

impl FileSystem {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from existing adapters, in order.
    pub fn with_adapters(adapters: Vec<Arc<dyn Adapter>>) -> Self {
        Self { adapters }
    }

    /// Register an adapter. Duplicate prefixes are accepted here and only
    /// reported when an operation runs.
    pub fn add_adapter(&mut self, adapter: impl Adapter + 'static) {
        self.adapters.push(Arc::new(adapter));
    }

    /// Register an adapter that's already in an Arc.
    pub fn add_adapter_arc(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.push(adapter);
    }

    pub fn adapters(&self) -> &[Arc<dyn Adapter>] {
        &self.adapters
    }

    /// Registered prefixes in registration order.
    pub fn prefixes(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.prefix().to_string()).collect()
    }

    /// Validate the registry and find the adapter for `prefix`.
    ///
    /// Does not connect.
    pub fn get_adapter(&self, prefix: &str) -> Result<Arc<dyn Adapter>> {
        if self.adapters.is_empty() {
            return Err(FsError::NoAdaptersRegistered);
        }

        let registered = self.prefixes();
        let duplicates = duplicate_prefixes(&registered);
        if !duplicates.is_empty() {
            return Err(FsError::DuplicateAdapterPrefix {
                duplicates,
                registered,
            });
        }

        self.adapters
            .iter()
            .find(|a| a.prefix() == prefix)
            .cloned()
            .ok_or_else(|| FsError::AdapterNotFound {
                prefix: prefix.to_string(),
                registered,
            })
    }

    /// Look up and connect the adapter for `prefix`.
    pub async fn connected_adapter(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn Adapter>> {
        let adapter = self.get_adapter(prefix)?;
        adapter.connect(cancel).await?;
        Ok(adapter)
    }

    /// Resolve a virtual path to a connected adapter and a relative path.
    pub(crate) async fn resolve(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<(Arc<dyn Adapter>, String)> {
        let (prefix, relative) = path::resolve_prefix_and_path(virtual_path)?;
        let adapter = self.connected_adapter(&prefix, cancel).await?;
        tracing::debug!(prefix = %prefix, path = %relative, "dispatching");
        Ok((adapter, relative))
    }

    pub async fn get_file(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<FileModel> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.get_file(&path, cancel).await
    }

    pub async fn get_directory(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<DirectoryModel> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.get_directory(&path, cancel).await
    }

    pub async fn list_files(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileModel>> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.list_files(&path, cancel).await
    }

    pub async fn list_directories(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DirectoryModel>> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.list_directories(&path, cancel).await
    }

    /// Directories first, then files, each sorted by name.
    pub async fn list_entries(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntryModel>> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        let dirs = adapter.list_directories(&path, cancel).await?;
        let files = adapter.list_files(&path, cancel).await?;
        Ok(dirs
            .into_iter()
            .map(EntryModel::from)
            .chain(files.into_iter().map(EntryModel::from))
            .collect())
    }

    pub async fn file_exists(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<bool> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter::file_exists(adapter.as_ref(), &path, cancel).await
    }

    pub async fn directory_exists(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter::directory_exists(adapter.as_ref(), &path, cancel).await
    }

    pub async fn create_directory(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.create_directory(&path, cancel).await
    }

    pub async fn delete_file(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<()> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.delete_file(&path, cancel).await
    }

    pub async fn delete_directory(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.delete_directory(&path, cancel).await
    }

    pub async fn read_file(&self, virtual_path: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.read_file(&path, cancel).await
    }

    pub async fn read_file_stream(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<FileStream> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.read_file_stream(&path, cancel).await
    }

    /// Read a file as UTF-8, replacing invalid sequences.
    pub async fn read_text_file(
        &self,
        virtual_path: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let bytes = self.read_file(virtual_path, cancel).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn write_file(
        &self,
        virtual_path: &str,
        contents: &[u8],
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.write_file(&path, contents, overwrite, cancel).await
    }

    pub async fn write_text_file(
        &self,
        virtual_path: &str,
        contents: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.write_file(virtual_path, contents.as_bytes(), overwrite, cancel)
            .await
    }

    pub async fn append_file(
        &self,
        virtual_path: &str,
        contents: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (adapter, path) = self.resolve(virtual_path, cancel).await?;
        adapter.append_file(&path, contents, cancel).await
    }

    pub async fn append_text_file(
        &self,
        virtual_path: &str,
        contents: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.append_file(virtual_path, contents.as_bytes(), cancel)
            .await
    }
}

/// Prefixes registered more than once, in first-seen order.
fn duplicate_prefixes(prefixes: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for prefix in prefixes {
        *counts.entry(prefix.as_str()).or_default() += 1;
    }

    let mut duplicates: Vec<String> = Vec::new();
    for prefix in prefixes {
        if counts[prefix.as_str()] > 1 && !duplicates.contains(prefix) {
            duplicates.push(prefix.clone());
        }
    }
    duplicates
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("adapters", &self.prefixes())
            .finish()
    }
}
