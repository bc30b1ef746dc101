//! File and directory descriptors returned by lookups and listings.

use std::time::SystemTime;

use serde::Serialize;

/// A file as seen through an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileModel {
    /// Last path segment.
    pub name: String,
    /// Backend-native path (root path included).
    pub path: String,
    /// `prefix://relative/path`.
    pub virtual_path: String,
    /// Size in bytes, if the backend reports it.
    pub length: Option<u64>,
    pub last_modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
}

/// A directory as seen through an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryModel {
    pub name: String,
    pub path: String,
    pub virtual_path: String,
    pub last_modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
}

/// Either kind of descriptor, for callers that list both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryModel {
    File(FileModel),
    Directory(DirectoryModel),
}

impl EntryModel {
    pub fn name(&self) -> &str {
        match self {
            Self::File(f) => &f.name,
            Self::Directory(d) => &d.name,
        }
    }

    pub fn virtual_path(&self) -> &str {
        match self {
            Self::File(f) => &f.virtual_path,
            Self::Directory(d) => &d.virtual_path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }
}

impl From<FileModel> for EntryModel {
    fn from(file: FileModel) -> Self {
        Self::File(file)
    }
}

impl From<DirectoryModel> for EntryModel {
    fn from(dir: DirectoryModel) -> Self {
        Self::Directory(dir)
    }
}
