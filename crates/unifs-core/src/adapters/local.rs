//! Local filesystem adapter.
//!
//! Maps `prefix://a/b.txt` to `<root>/a/b.txt` on disk, with optional
//! read-only mode.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::adapter::{
    cancellable, directory_exists, ensure_directory, ensure_file, ensure_writable, Adapter,
};
use crate::error::{Classify, ErrorContext, FsError, Result};
use crate::models::{DirectoryModel, FileModel};
use crate::path::{self, ROOT};

/// Local filesystem adapter.
#[derive(Debug)]
pub struct LocalAdapter {
    prefix: String,
    root_path: String,
    read_only: bool,
    connected: AtomicBool,
}

impl LocalAdapter {
    /// Create an adapter serving `root` under `prefix`.
    pub fn new(prefix: impl Into<String>, root: impl AsRef<str>) -> Self {
        Self {
            prefix: prefix.into(),
            root_path: path::normalize_root_path(root.as_ref()),
            read_only: false,
            connected: AtomicBool::new(false),
        }
    }

    /// Create a read-only adapter. Writes fail as authorization errors.
    pub fn read_only(prefix: impl Into<String>, root: impl AsRef<str>) -> Self {
        Self {
            read_only: true,
            ..Self::new(prefix, root)
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Physical path for a relative path, without touching the disk.
    ///
    /// `.` segments are dropped and `..` is rejected, so the result is
    /// always spelled under the root.
    fn physical(&self, relative: &str) -> Result<String> {
        let joined = path::physical_path(&path::clean_relative(relative)?, &self.root_path);
        if self.root_path == ROOT {
            Ok(format!("{ROOT}{joined}"))
        } else {
            Ok(joined)
        }
    }

    /// Physical path for a relative path that is still under the root once
    /// symlinks are followed.
    async fn resolve(
        &self,
        relative: &str,
        ctx: ErrorContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let physical = self.physical(relative)?;
        let contained = cancellable(cancel, self.contains(Path::new(&physical)))
            .await
            .map_err(|e| self.classify(e, ctx))?;
        if !contained {
            return Err(FsError::invalid_path(relative, "path escapes adapter root"));
        }
        Ok(physical)
    }

    /// Whether `physical` stays under the canonical root.
    ///
    /// Paths that do not exist yet are judged by their deepest existing
    /// ancestor.
    async fn contains(&self, physical: &Path) -> io::Result<bool> {
        let root = fs::canonicalize(&self.root_path)
            .await
            .unwrap_or_else(|_| PathBuf::from(&self.root_path));

        let mut candidate = physical.to_path_buf();
        loop {
            match fs::canonicalize(&candidate).await {
                Ok(canonical) => return Ok(canonical.starts_with(&root)),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                    ) =>
                {
                    if !candidate.pop() {
                        return Ok(true);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.read_only {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "filesystem is read-only",
            ))
        } else {
            Ok(())
        }
    }

    fn file_model(&self, physical: &str, meta: &Metadata) -> Result<FileModel> {
        let physical = physical.replace('\\', "/");
        Ok(FileModel {
            name: path::last_segment(&physical),
            virtual_path: path::virtual_path(&physical, &self.prefix, &self.root_path)?,
            length: Some(meta.len()),
            last_modified: meta.modified().ok(),
            created: meta.created().ok(),
            path: physical,
        })
    }

    fn directory_model(&self, physical: &str, meta: &Metadata) -> Result<DirectoryModel> {
        let physical = physical.replace('\\', "/");
        Ok(DirectoryModel {
            name: path::last_segment(&physical),
            virtual_path: path::virtual_path(&physical, &self.prefix, &self.root_path)?,
            last_modified: meta.modified().ok(),
            created: meta.created().ok(),
            path: physical,
        })
    }

    /// Entries directly inside the directory `physical` whose metadata
    /// satisfies `keep`.
    ///
    /// Symlinks are followed the same way lookups follow them. Dangling links
    /// and links leading outside the root are skipped.
    async fn entries(
        &self,
        physical: &str,
        keep: fn(&Metadata) -> bool,
        cancel: &CancellationToken,
    ) -> io::Result<Vec<(String, Metadata)>> {
        let mut dir = cancellable(cancel, fs::read_dir(physical)).await?;
        let mut entries = Vec::new();

        while let Some(entry) = cancellable(cancel, dir.next_entry()).await? {
            let entry_path = entry.path();
            let meta = match cancellable(cancel, fs::metadata(&entry_path)).await {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if !keep(&meta) {
                continue;
            }
            if is_symlink(&entry, cancel).await?
                && !cancellable(cancel, self.contains(&entry_path)).await?
            {
                tracing::debug!(path = %entry_path.display(), "skipping symlink outside root");
                continue;
            }
            entries.push((entry_path.to_string_lossy().into_owned(), meta));
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    fn file_ctx<'a>(&'a self, path: &'a str) -> ErrorContext<'a> {
        ErrorContext::file(&self.prefix, path)
    }

    fn dir_ctx<'a>(&'a self, path: &'a str) -> ErrorContext<'a> {
        ErrorContext::directory(&self.prefix, path)
    }
}

async fn is_symlink(entry: &fs::DirEntry, cancel: &CancellationToken) -> io::Result<bool> {
    let file_type = cancellable(cancel, entry.file_type()).await?;
    Ok(file_type.is_symlink())
}

/// Pull a taxonomy error back out of an `io::Error` that carries one.
fn take_fs_error(err: io::Error) -> std::result::Result<FsError, io::Error> {
    if !err.get_ref().is_some_and(|inner| inner.is::<FsError>()) {
        return Err(err);
    }
    let kind = err.kind();
    match err.into_inner().map(|inner| inner.downcast::<FsError>()) {
        Some(Ok(fs_err)) => Ok(*fs_err),
        Some(Err(other)) => Err(io::Error::new(kind, other)),
        None => Err(io::Error::from(kind)),
    }
}

impl Classify for LocalAdapter {
    type Native = io::Error;

    fn classify(&self, native: io::Error, ctx: ErrorContext<'_>) -> FsError {
        let native = match take_fs_error(native) {
            Ok(fs_err) => return fs_err,
            Err(native) => native,
        };

        match native.kind() {
            io::ErrorKind::PermissionDenied => FsError::connection(ctx.prefix, native),
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => ctx.not_found(),
            _ => FsError::runtime(ctx.prefix, native),
        }
    }
}

#[async_trait]
impl Adapter for LocalAdapter {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn root_path(&self) -> &str {
        &self.root_path
    }

    async fn connect(&self, cancel: &CancellationToken) -> Result<()> {
        if self.connected.load(Ordering::Acquire) {
            return Ok(());
        }

        let meta = cancellable(cancel, fs::metadata(&self.root_path))
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::Interrupted => FsError::runtime(&self.prefix, e),
                _ => FsError::connection(&self.prefix, e),
            })?;
        if !meta.is_dir() {
            return Err(FsError::connection(
                &self.prefix,
                io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("root path is not a directory: {}", self.root_path),
                ),
            ));
        }

        self.connected.store(true, Ordering::Release);
        tracing::debug!(prefix = %self.prefix, root = %self.root_path, "local adapter connected");
        Ok(())
    }

    async fn get_file(&self, path: &str, cancel: &CancellationToken) -> Result<FileModel> {
        let physical = self.resolve(path, self.file_ctx(path), cancel).await?;
        let meta = cancellable(cancel, fs::metadata(&physical))
            .await
            .map_err(|e| self.classify(e, self.file_ctx(path)))?;

        if !meta.is_file() {
            return Err(FsError::file_not_found(&self.prefix, path));
        }
        self.file_model(&physical, &meta)
    }

    async fn get_directory(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<DirectoryModel> {
        let physical = self.resolve(path, self.dir_ctx(path), cancel).await?;
        let meta = cancellable(cancel, fs::metadata(&physical))
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))?;

        if !meta.is_dir() {
            return Err(FsError::directory_not_found(&self.prefix, path));
        }
        self.directory_model(&physical, &meta)
    }

    async fn list_files(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<FileModel>> {
        ensure_directory(self, path, cancel).await?;
        let physical = self.resolve(path, self.dir_ctx(path), cancel).await?;
        let entries = self
            .entries(&physical, Metadata::is_file, cancel)
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))?;

        entries
            .iter()
            .map(|(physical, meta)| self.file_model(physical, meta))
            .collect()
    }

    async fn list_directories(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DirectoryModel>> {
        ensure_directory(self, path, cancel).await?;
        let physical = self.resolve(path, self.dir_ctx(path), cancel).await?;
        let entries = self
            .entries(&physical, Metadata::is_dir, cancel)
            .await
            .map_err(|e| self.classify(e, self.dir_ctx(path)))?;

        entries
            .iter()
            .map(|(physical, meta)| self.directory_model(physical, meta))
            .collect()
    }

    async fn create_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        if directory_exists(self, path, cancel).await? {
            return Err(FsError::directory_exists(&self.prefix, path));
        }
        let physical = self.resolve(path, self.dir_ctx(path), cancel).await?;

        async {
            self.check_writable()?;
            cancellable(cancel, fs::create_dir_all(&physical)).await
        }
        .await
        .map_err(|e| self.classify(e, self.dir_ctx(path)))
    }

    async fn delete_directory(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        if path::clean_relative(path)?.is_empty() {
            return Err(FsError::invalid_path(path, "cannot delete the adapter root"));
        }
        ensure_directory(self, path, cancel).await?;
        let physical = self.resolve(path, self.dir_ctx(path), cancel).await?;

        async {
            self.check_writable()?;
            cancellable(cancel, fs::remove_dir_all(&physical)).await
        }
        .await
        .map_err(|e| self.classify(e, self.dir_ctx(path)))
    }

    async fn delete_file(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        let file = self.get_file(path, cancel).await?;

        async {
            self.check_writable()?;
            cancellable(cancel, fs::remove_file(&file.path)).await
        }
        .await
        .map_err(|e| self.classify(e, self.file_ctx(path)))
    }

    async fn read_file(&self, path: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let file = self.get_file(path, cancel).await?;
        cancellable(cancel, fs::read(&file.path))
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
        let physical = self.resolve(path, self.file_ctx(path), cancel).await?;

        async {
            self.check_writable()?;
            if let Some(parent) = Path::new(&physical).parent()
                && !parent.as_os_str().is_empty()
            {
                cancellable(cancel, fs::create_dir_all(parent)).await?;
            }
            cancellable(cancel, fs::write(&physical, contents)).await
        }
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
        let physical = self.resolve(path, self.file_ctx(path), cancel).await?;

        async {
            self.check_writable()?;
            let mut file = cancellable(
                cancel,
                fs::OpenOptions::new().append(true).open(&physical),
            )
            .await?;
            cancellable(cancel, file.write_all(contents)).await?;
            cancellable(cancel, file.flush()).await
        }
        .await
        .map_err(|e| self.classify(e, self.file_ctx(path)))
    }
}
