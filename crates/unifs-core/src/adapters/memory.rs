//! In-memory object store adapter.
//!
//! Models a flat key/value object store the way S3-like backends look:
//! keys are full paths, directories exist implicitly when some key lives
//! under them, and an empty directory is represented by a placeholder
//! marker key ending in `/`. Listings tell files and directories apart by
//! that trailing-separator convention, never by name.
//!
//! Data is lost when the adapter is dropped.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;

use crate::adapter::{
    cancellable, directory_exists, ensure_directory, ensure_file, ensure_writable, Adapter,
    Cancelled,
};
use crate::error::{Classify, ErrorContext, FsError, Result};
use crate::models::{DirectoryModel, FileModel};
use crate::path::{self, ROOT};

/// Native failures of the in-memory store.
#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("no such key: {0}")]
    NoSuchKey(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("key conflicts with existing directory: {0}")]
    KeyConflict(String),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error(transparent)]
    Taxonomy(#[from] FsError),
}

#[derive(Debug, Clone)]
struct Object {
    data: Vec<u8>,
    created: SystemTime,
    modified: SystemTime,
}

impl Object {
    fn new(data: Vec<u8>) -> Self {
        let now = SystemTime::now();
        Self {
            data,
            created: now,
            modified: now,
        }
    }
}

/// In-memory object store adapter.
#[derive(Debug)]
pub struct MemoryAdapter {
    prefix: String,
    root_path: String,
    connected: AtomicBool,
    objects: RwLock<BTreeMap<String, Object>>,
}

impl MemoryAdapter {
    /// Create an empty store with the canonical root.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_root(prefix, ROOT)
    }

    /// Create an empty store whose keys all live under `root`.
    pub fn with_root(prefix: impl Into<String>, root: impl AsRef<str>) -> Self {
        Self {
            prefix: prefix.into(),
            root_path: path::normalize_root_path(root.as_ref()),
            connected: AtomicBool::new(false),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Object key for a relative path: the physical path without a leading
    /// separator, with empty and `.` segments dropped. `..` is rejected.
    fn key(&self, relative: &str) -> Result<String> {
        let relative = path::clean_relative(relative)?;
        Ok(path::physical_path(&relative, &self.root_path)
            .trim_start_matches('/')
            .to_string())
    }

    /// Key prefix shared by everything inside the directory `key`.
    fn dir_prefix(key: &str) -> String {
        if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        }
    }

    fn physical(&self, key: &str) -> String {
        if self.root_path.starts_with('/') && self.root_path != ROOT {
            format!("/{key}")
        } else {
            key.to_string()
        }
    }

    async fn read(
        &self,
        cancel: &CancellationToken,
    ) -> std::result::Result<RwLockReadGuard<'_, BTreeMap<String, Object>>, ObjectStoreError> {
        self.check_connected()?;
        cancellable(cancel, async { Ok(self.objects.read().await) }).await
    }

    async fn write(
        &self,
        cancel: &CancellationToken,
    ) -> std::result::Result<RwLockWriteGuard<'_, BTreeMap<String, Object>>, ObjectStoreError> {
        self.check_connected()?;
        cancellable(cancel, async { Ok(self.objects.write().await) }).await
    }

    fn check_connected(&self) -> std::result::Result<(), ObjectStoreError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ObjectStoreError::AccessDenied(format!(
                "adapter '{}' is not connected",
                self.prefix
            )))
        }
    }

    fn directory_present(objects: &BTreeMap<String, Object>, root_key: &str, key: &str) -> bool {
        if key == root_key {
            return true;
        }
        let prefix = Self::dir_prefix(key);
        objects
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }

    fn file_model(&self, key: &str, object: &Object) -> Result<FileModel> {
        let physical = self.physical(key);
        Ok(FileModel {
            name: path::last_segment(key),
            virtual_path: path::virtual_path(&physical, &self.prefix, &self.root_path)?,
            length: Some(object.data.len() as u64),
            last_modified: Some(object.modified),
            created: Some(object.created),
            path: physical,
        })
    }

    fn directory_model(&self, key: &str, marker: Option<&Object>) -> Result<DirectoryModel> {
        let physical = self.physical(key);
        Ok(DirectoryModel {
            name: path::last_segment(key),
            virtual_path: path::virtual_path(&physical, &self.prefix, &self.root_path)?,
            last_modified: marker.map(|m| m.modified),
            created: marker.map(|m| m.created),
            path: physical,
        })
    }

    async fn head_file(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<FileModel, ObjectStoreError> {
        let key = self.key(path)?;
        let objects = self.read(cancel).await?;
        match objects.get(&key) {
            Some(object) if !key.is_empty() => Ok(self.file_model(&key, object)?),
            _ => Err(ObjectStoreError::NoSuchKey(key)),
        }
    }

    async fn head_directory(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<DirectoryModel, ObjectStoreError> {
        let key = self.key(path)?;
        let root_key = self.key("")?;
        let objects = self.read(cancel).await?;
        if !Self::directory_present(&objects, &root_key, &key) {
            return Err(ObjectStoreError::NoSuchKey(Self::dir_prefix(&key)));
        }
        let marker = objects.get(&Self::dir_prefix(&key));
        Ok(self.directory_model(&key, marker)?)
    }

    /// Direct children of a directory as `(files, directory names)`.
    async fn children(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<(Vec<FileModel>, BTreeSet<String>), ObjectStoreError> {
        let prefix = Self::dir_prefix(&self.key(path)?);
        let objects = self.read(cancel).await?;

        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();
        for (key, object) in objects.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                // The directory's own placeholder marker.
                None if rest.is_empty() => {}
                None => files.push(self.file_model(key, object)?),
                Some((child, _)) => {
                    dirs.insert(format!("{prefix}{child}"));
                }
            }
        }
        Ok((files, dirs))
    }

    async fn put(
        &self,
        path: &str,
        contents: Vec<u8>,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), ObjectStoreError> {
        let key = self.key(path)?;
        let root_key = self.key("")?;
        if key.is_empty() || key == root_key {
            return Err(FsError::invalid_path(path, "cannot write to the adapter root").into());
        }

        let mut objects = self.write(cancel).await?;
        if Self::directory_present(&objects, &root_key, &key) {
            return Err(ObjectStoreError::KeyConflict(key));
        }

        let created = objects.get(&key).map(|o| o.created);
        let mut object = Object::new(contents);
        if let Some(created) = created {
            object.created = created;
        }
        objects.insert(key, object);
        Ok(())
    }

    async fn append(
        &self,
        path: &str,
        contents: &[u8],
        cancel: &CancellationToken,
    ) -> std::result::Result<(), ObjectStoreError> {
        let key = self.key(path)?;
        let mut objects = self.write(cancel).await?;
        let object = objects
            .get_mut(&key)
            .ok_or_else(|| ObjectStoreError::NoSuchKey(key.clone()))?;

        object.data.extend_from_slice(contents);
        object.modified = SystemTime::now();
        Ok(())
    }

    async fn remove(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), ObjectStoreError> {
        let key = self.key(path)?;
        let mut objects = self.write(cancel).await?;
        objects
            .remove(&key)
            .map(|_| ())
            .ok_or(ObjectStoreError::NoSuchKey(key))
    }

    async fn put_marker(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), ObjectStoreError> {
        let key = self.key(path)?;
        let mut objects = self.write(cancel).await?;
        if objects.contains_key(&key) {
            return Err(ObjectStoreError::KeyConflict(key));
        }
        objects.insert(Self::dir_prefix(&key), Object::new(Vec::new()));
        Ok(())
    }

    async fn remove_prefix(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<(), ObjectStoreError> {
        let prefix = Self::dir_prefix(&self.key(path)?);
        let mut objects = self.write(cancel).await?;
        objects.retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    fn file_ctx<'a>(&'a self, path: &'a str) -> ErrorContext<'a> {
        ErrorContext::file(&self.prefix, path)
    }

    fn dir_ctx<'a>(&'a self, path: &'a str) -> ErrorContext<'a> {
        ErrorContext::directory(&self.prefix, path)
    }
}

impl Classify for MemoryAdapter {
    type Native = ObjectStoreError;

    fn classify(&self, native: ObjectStoreError, ctx: ErrorContext<'_>) -> FsError {
        match native {
            ObjectStoreError::Taxonomy(err) => err,
            ObjectStoreError::NoSuchKey(_) => ctx.not_found(),
            denied @ ObjectStoreError::AccessDenied(_) => FsError::connection(ctx.prefix, denied),
            other => FsError::runtime(ctx.prefix, other),
        }
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn root_path(&self) -> &str {
        &self.root_path
    }

    async fn connect(&self, _cancel: &CancellationToken) -> Result<()> {
        if !self.connected.swap(true, Ordering::AcqRel) {
            tracing::debug!(prefix = %self.prefix, "memory adapter connected");
        }
        Ok(())
    }

    async fn get_file(&self, path: &str, cancel: &CancellationToken) -> Result<FileModel> {
        self.head_file(path, cancel)
            .await
            .map_err(|e| self.classify(e, self.file_ctx(path)))
    }

    async fn get_directory(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<DirectoryModel> {
        self.head_directory(path, cancel)
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))
    }

    async fn list_files(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<FileModel>> {
        ensure_directory(self, path, cancel).await?;
        let (files, _) = self
            .children(path, cancel)
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))?;
        Ok(files)
    }

    async fn list_directories(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DirectoryModel>> {
        ensure_directory(self, path, cancel).await?;
        let (_, dirs) = self
            .children(path, cancel)
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))?;

        let objects = self
            .read(cancel)
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))?;
        dirs.iter()
            .map(|key| self.directory_model(key, objects.get(&Self::dir_prefix(key))))
            .collect()
    }

    async fn create_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        if directory_exists(self, path, cancel).await? {
            return Err(FsError::directory_exists(&self.prefix, path));
        }
        self.put_marker(path, cancel)
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))
    }

    async fn delete_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        if path::clean_relative(path)?.is_empty() {
            return Err(FsError::invalid_path(path, "cannot delete the adapter root"));
        }
        ensure_directory(self, path, cancel).await?;
        self.remove_prefix(path, cancel)
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))
    }

    async fn delete_file(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        self.remove(path, cancel)
            .await
            .map_err(|e| self.classify(e, self.file_ctx(path)))
    }

    async fn read_file(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        async {
            let key = self.key(path)?;
            let objects = self.read(cancel).await?;
            match objects.get(&key) {
                Some(object) if !key.is_empty() => Ok(object.data.clone()),
                _ => Err(ObjectStoreError::NoSuchKey(key)),
            }
        }
        .await
        .map_err(|e| self.classify(e, self.file_ctx(path)))
    }

    async fn write_file(
        &self,
        path: &str,
        contents: &[u8],
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_writable(self, path, overwrite, cancel).await?;
        self.put(path, contents.to_vec(), cancel)
            .await
            .map_err(|e| self.classify(e, self.file_ctx(path)))
    }

    async fn append_file(
        &self,
        path: &str,
        contents: &[u8],
        cancel: &CancellationToken,
    ) -> Result<()> {
        ensure_file(self, path, cancel).await?;
        self.append(path, contents, cancel)
            .await
            .map_err(|e| self.classify(e, self.file_ctx(path)))
    }
}
