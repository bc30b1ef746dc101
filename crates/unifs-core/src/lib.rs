//! unifs-core: one API for files on many storage backends.
//!
//! Files are addressed by virtual paths of the form `prefix://relative/path`.
//! The prefix selects a registered [`Adapter`]; the relative path is resolved
//! under that adapter's root.
//!
//! ```text
//! files://reports/q3.csv    →  LocalAdapter rooted at /srv/data
//! scratch://tmp/blob.bin    →  MemoryAdapter
//! ```
//!
//! This crate provides:
//!
//! - **Path resolution** ([`path`]): parsing virtual paths and mapping
//!   physical paths back into the virtual namespace
//! - **Error taxonomy** ([`FsError`]): the only error type that crosses an
//!   adapter boundary, plus the [`Classify`] contract for native errors
//! - **Adapter contract** ([`Adapter`]) with shared existence checks
//! - **Dispatcher** ([`FileSystem`]): registry validation, lookup, connect,
//!   delegate; copy and move across adapters
//! - **Blocking facade** ([`BlockingFileSystem`])
//! - **Configuration** ([`config`]) and two reference adapters

pub mod adapter;
pub mod adapters;
pub mod blocking;
pub mod config;
pub mod error;
pub mod fs;
pub mod models;
pub mod path;
mod transfer;

pub use adapter::{directory_exists, file_exists, Adapter, FileStream};
pub use adapters::{LocalAdapter, MemoryAdapter};
pub use blocking::BlockingFileSystem;
pub use config::{ConfigError, FileSystemConfig};
pub use error::{Classify, ErrorContext, ErrorKind, FsError, Result, Target};
pub use fs::FileSystem;
pub use models::{DirectoryModel, EntryModel, FileModel};

/// Re-exported so callers don't need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
