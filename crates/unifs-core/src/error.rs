//! Error taxonomy shared by the resolver, the registry and every adapter.
//!
//! Adapters never let their native error types escape: each one implements
//! [`Classify`] and runs every failure through it before returning.

use std::fmt;

use thiserror::Error;

/// Boxed native cause carried by connection and runtime errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for all unifs operations.
pub type Result<T> = std::result::Result<T, FsError>;

/// The closed set of failures a caller can observe.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("prefix not found in path '{path}': expected 'prefix://path'")]
    PrefixNotFoundInPath { path: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid virtual path '{path}': {reason}")]
    InvalidVirtualPath { path: String, reason: String },

    #[error("no adapters registered")]
    NoAdaptersRegistered,

    #[error(
        "duplicate adapter prefixes [{}] in registry [{}]",
        .duplicates.join(", "),
        .registered.join(", ")
    )]
    DuplicateAdapterPrefix {
        duplicates: Vec<String>,
        registered: Vec<String>,
    },

    #[error(
        "no adapter registered for prefix '{prefix}', registered: [{}]",
        .registered.join(", ")
    )]
    AdapterNotFound {
        prefix: String,
        registered: Vec<String>,
    },

    #[error("file not found: {prefix}://{path}")]
    FileNotFound { prefix: String, path: String },

    #[error("directory not found: {prefix}://{path}")]
    DirectoryNotFound { prefix: String, path: String },

    #[error("file already exists: {prefix}://{path}")]
    FileExists { prefix: String, path: String },

    #[error("directory already exists: {prefix}://{path}")]
    DirectoryExists { prefix: String, path: String },

    #[error("connection error in adapter '{prefix}': {source}")]
    Connection {
        prefix: String,
        #[source]
        source: BoxError,
    },

    #[error("adapter '{prefix}' failed: {source}")]
    AdapterRuntime {
        prefix: String,
        #[source]
        source: BoxError,
    },
}

/// Discriminant of [`FsError`], convenient for matching and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PrefixNotFoundInPath,
    InvalidPath,
    InvalidVirtualPath,
    NoAdaptersRegistered,
    DuplicateAdapterPrefix,
    AdapterNotFound,
    FileNotFound,
    DirectoryNotFound,
    FileExists,
    DirectoryExists,
    Connection,
    AdapterRuntime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PrefixNotFoundInPath { .. } => ErrorKind::PrefixNotFoundInPath,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::InvalidVirtualPath { .. } => ErrorKind::InvalidVirtualPath,
            Self::NoAdaptersRegistered => ErrorKind::NoAdaptersRegistered,
            Self::DuplicateAdapterPrefix { .. } => ErrorKind::DuplicateAdapterPrefix,
            Self::AdapterNotFound { .. } => ErrorKind::AdapterNotFound,
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::DirectoryNotFound { .. } => ErrorKind::DirectoryNotFound,
            Self::FileExists { .. } => ErrorKind::FileExists,
            Self::DirectoryExists { .. } => ErrorKind::DirectoryExists,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::AdapterRuntime { .. } => ErrorKind::AdapterRuntime,
        }
    }

    /// True for `FileNotFound` and `DirectoryNotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::FileNotFound | ErrorKind::DirectoryNotFound
        )
    }

    pub fn file_not_found(prefix: impl Into<String>, path: impl Into<String>) -> Self {
        Self::FileNotFound {
            prefix: prefix.into(),
            path: path.into(),
        }
    }

    pub fn directory_not_found(prefix: impl Into<String>, path: impl Into<String>) -> Self {
        Self::DirectoryNotFound {
            prefix: prefix.into(),
            path: path.into(),
        }
    }

    pub fn file_exists(prefix: impl Into<String>, path: impl Into<String>) -> Self {
        Self::FileExists {
            prefix: prefix.into(),
            path: path.into(),
        }
    }

    pub fn directory_exists(prefix: impl Into<String>, path: impl Into<String>) -> Self {
        Self::DirectoryExists {
            prefix: prefix.into(),
            path: path.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_virtual_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVirtualPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn connection(prefix: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            prefix: prefix.into(),
            source: source.into(),
        }
    }

    pub fn runtime(prefix: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::AdapterRuntime {
            prefix: prefix.into(),
            source: source.into(),
        }
    }
}

/// Whether the failing call was addressing a file or a directory.
///
/// Native "does not exist" errors rarely say which one was meant, so the
/// call site supplies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    File,
    Directory,
}

/// Where a native error happened, for building taxonomy errors.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub prefix: &'a str,
    pub path: &'a str,
    pub target: Target,
}

impl<'a> ErrorContext<'a> {
    pub fn file(prefix: &'a str, path: &'a str) -> Self {
        Self {
            prefix,
            path,
            target: Target::File,
        }
    }

    pub fn directory(prefix: &'a str, path: &'a str) -> Self {
        Self {
            prefix,
            path,
            target: Target::Directory,
        }
    }

    /// The `FileNotFound`/`DirectoryNotFound` error matching this context.
    pub fn not_found(&self) -> FsError {
        match self.target {
            Target::File => FsError::file_not_found(self.prefix, self.path),
            Target::Directory => FsError::directory_not_found(self.prefix, self.path),
        }
    }
}

/// Translation from an adapter's native failures into the taxonomy.
///
/// Implementations must:
///
/// 1. return taxonomy errors carried inside the native error unchanged,
/// 2. map authentication/authorization failures to [`FsError::Connection`],
/// 3. map "does not exist" failures to [`ErrorContext::not_found`],
/// 4. wrap anything else in [`FsError::AdapterRuntime`].
///
/// `classify` is a pure function so it can be tested without any I/O.
pub trait Classify {
    type Native;

    fn classify(&self, native: Self::Native, ctx: ErrorContext<'_>) -> FsError;
}
