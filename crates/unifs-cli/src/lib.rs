//! Command-line front end for unifs virtual paths.
//!
//! Adapters come from a TOML config (see [`unifs_core::config`]). Every
//! subcommand addresses storage through `prefix://path` virtual paths, so
//! copying between adapters is just `unifs cp a://x b://y`.

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use unifs_core::{
    CancellationToken, EntryModel, ErrorKind, FileSystem, FileSystemConfig,
};

/// Browse and move files across storage adapters.
#[derive(Parser, Debug)]
#[command(name = "unifs", version)]
#[command(about = "Uniform file operations over prefix://path virtual paths")]
pub struct Cli {
    /// Config file [default: $XDG_CONFIG_HOME/unifs/config.toml]
    #[arg(long, global = true, env = "UNIFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print descriptors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List directories and files under a directory
    Ls {
        path: String,
        /// Show kind, size and modification time
        #[arg(short, long)]
        long: bool,
    },
    /// Describe a file or directory
    Stat { path: String },
    /// Report whether a path is a file, a directory or missing
    Exists { path: String },
    /// Write a file's contents to stdout
    Cat { path: String },
    /// Write stdin (or --from) to a file
    Put {
        path: String,
        /// Read contents from this local file instead of stdin
        #[arg(long)]
        from: Option<PathBuf>,
        /// Replace the file if it exists
        #[arg(long)]
        overwrite: bool,
    },
    /// Append stdin (or --from) to an existing file
    Append {
        path: String,
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Delete a file
    Rm { path: String },
    /// Delete a directory and everything in it
    Rmdir { path: String },
    /// Copy a file, possibly across adapters
    Cp {
        source: String,
        destination: String,
        #[arg(long)]
        overwrite: bool,
    },
    /// Move a file, possibly across adapters
    Mv {
        source: String,
        destination: String,
        #[arg(long)]
        overwrite: bool,
    },
}

/// Build the file system from an explicit config, or from the default
/// location if one exists.
///
/// A missing default config yields an empty registry; operations then fail
/// with "no adapters registered".
pub fn load_file_system(explicit: Option<&Path>) -> Result<FileSystem> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = paths::config_file();
            if !path.exists() {
                tracing::warn!(path = %path.display(), "no config found, starting without adapters");
                return Ok(FileSystem::new());
            }
            path
        }
    };

    let config = FileSystemConfig::load(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    tracing::debug!(path = %path.display(), adapters = config.adapters.len(), "loaded config");
    Ok(config.build())
}

/// Run one subcommand, writing its output to `out`.
pub async fn execute<W>(
    fs: &FileSystem,
    command: Command,
    json: bool,
    out: &mut W,
    cancel: &CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    match command {
        Command::Ls { path, long } => {
            let entries = fs
                .list_entries(&path, cancel)
                .await
                .with_context(|| format!("cannot list {path}"))?;
            if json {
                write_json(out, &entries).await?;
            } else {
                for entry in &entries {
                    let line = if long {
                        long_listing(entry)
                    } else if entry.is_dir() {
                        format!("{}/", entry.name())
                    } else {
                        entry.name().to_string()
                    };
                    write_line(out, &line).await?;
                }
            }
        }
        Command::Stat { path } => {
            let entry = stat(fs, &path, cancel)
                .await
                .with_context(|| format!("cannot stat {path}"))?;
            if json {
                write_json(out, &entry).await?;
            } else {
                for line in describe(&entry) {
                    write_line(out, &line).await?;
                }
            }
        }
        Command::Exists { path } => {
            let kind = if fs.file_exists(&path, cancel).await? {
                "file"
            } else if fs.directory_exists(&path, cancel).await? {
                "directory"
            } else {
                "missing"
            };
            if json {
                write_json(out, &serde_json::json!({ "path": path, "exists": kind })).await?;
            } else {
                write_line(out, kind).await?;
            }
        }
        Command::Cat { path } => {
            let mut stream = fs
                .read_file_stream(&path, cancel)
                .await
                .with_context(|| format!("cannot read {path}"))?;
            tokio::io::copy(&mut stream, out).await?;
        }
        Command::Put {
            path,
            from,
            overwrite,
        } => {
            let contents = read_input(from.as_deref()).await?;
            fs.write_file(&path, &contents, overwrite, cancel)
                .await
                .with_context(|| format!("cannot write {path}"))?;
        }
        Command::Append { path, from } => {
            let contents = read_input(from.as_deref()).await?;
            fs.append_file(&path, &contents, cancel)
                .await
                .with_context(|| format!("cannot append to {path}"))?;
        }
        Command::Mkdir { path } => {
            fs.create_directory(&path, cancel)
                .await
                .with_context(|| format!("cannot create {path}"))?;
        }
        Command::Rm { path } => {
            fs.delete_file(&path, cancel)
                .await
                .with_context(|| format!("cannot delete {path}"))?;
        }
        Command::Rmdir { path } => {
            fs.delete_directory(&path, cancel)
                .await
                .with_context(|| format!("cannot delete {path}"))?;
        }
        Command::Cp {
            source,
            destination,
            overwrite,
        } => {
            fs.copy_file(&source, &destination, overwrite, cancel)
                .await
                .with_context(|| format!("cannot copy {source} to {destination}"))?;
        }
        Command::Mv {
            source,
            destination,
            overwrite,
        } => {
            fs.move_file(&source, &destination, overwrite, cancel)
                .await
                .with_context(|| format!("cannot move {source} to {destination}"))?;
        }
    }
    Ok(())
}

/// File descriptor if `path` is a file, otherwise the directory descriptor.
async fn stat(
    fs: &FileSystem,
    path: &str,
    cancel: &CancellationToken,
) -> unifs_core::Result<EntryModel> {
    match fs.get_file(path, cancel).await {
        Ok(file) => Ok(file.into()),
        Err(e) if e.kind() == ErrorKind::FileNotFound => {
            Ok(fs.get_directory(path, cancel).await?.into())
        }
        Err(e) => Err(e),
    }
}

async fn read_input(from: Option<&Path>) -> Result<Vec<u8>> {
    match from {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("cannot read {}", path.display())),
        None => read_all(tokio::io::stdin()).await,
    }
}

async fn read_all(mut reader: impl AsyncRead + Unpin) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .await
        .context("cannot read stdin")?;
    Ok(buf)
}

fn long_listing(entry: &EntryModel) -> String {
    match entry {
        EntryModel::Directory(dir) => format!(
            "d {:>10} {} {}/",
            "-",
            format_time(dir.last_modified),
            dir.name
        ),
        EntryModel::File(file) => format!(
            "- {:>10} {} {}",
            file.length.map_or_else(|| "?".to_string(), |n| n.to_string()),
            format_time(file.last_modified),
            file.name
        ),
    }
}

fn describe(entry: &EntryModel) -> Vec<String> {
    match entry {
        EntryModel::File(file) => vec![
            format!("name: {}", file.name),
            "kind: file".to_string(),
            format!("virtual_path: {}", file.virtual_path),
            format!("path: {}", file.path),
            format!(
                "length: {}",
                file.length.map_or_else(|| "unknown".to_string(), |n| n.to_string())
            ),
            format!("modified: {}", format_time(file.last_modified)),
            format!("created: {}", format_time(file.created)),
        ],
        EntryModel::Directory(dir) => vec![
            format!("name: {}", dir.name),
            "kind: directory".to_string(),
            format!("virtual_path: {}", dir.virtual_path),
            format!("path: {}", dir.path),
            format!("modified: {}", format_time(dir.last_modified)),
            format!("created: {}", format_time(dir.created)),
        ],
    }
}

fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(t) => DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    Ok(())
}

async fn write_json<W, T>(out: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize + ?Sized,
{
    let text = serde_json::to_string_pretty(value)?;
    write_line(out, &text).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_copy_with_overwrite() {
        let cli = Cli::try_parse_from(["unifs", "cp", "a://x", "b://y", "--overwrite"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Cp {
                source: "a://x".into(),
                destination: "b://y".into(),
                overwrite: true,
            }
        );
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["unifs", "ls", "a://", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(
            cli.command,
            Command::Ls {
                path: "a://".into(),
                long: false,
            }
        );
    }

    #[test]
    fn put_requires_a_path() {
        assert!(Cli::try_parse_from(["unifs", "put"]).is_err());
    }

    #[test]
    fn missing_time_prints_dash() {
        assert_eq!(format_time(None), "-");
    }

    #[tokio::test]
    async fn read_all_collects_reader() {
        let data = read_all(&b"from stdin"[..]).await.unwrap();
        assert_eq!(data, b"from stdin");
    }
}
