//! Adapter configuration loaded from TOML.
//!
//! ```toml
//! [[adapters]]
//! prefix = "files"
//! kind = "local"
//! root = "/srv/data"
//!
//! [[adapters]]
//! prefix = "scratch"
//! kind = "memory"
//! ```
//!
//! Building a [`FileSystem`] from a config never fails: duplicate prefixes
//! are reported by the registry when an operation runs, like any other
//! registration.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::{LocalAdapter, MemoryAdapter};
use crate::fs::FileSystem;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration: the adapters to register, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileSystemConfig {
    #[serde(default)]
    pub adapters: Vec<AdapterConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdapterConfig {
    pub prefix: String,
    #[serde(flatten)]
    pub kind: AdapterKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AdapterKind {
    Local {
        root: String,
        #[serde(default)]
        read_only: bool,
    },
    Memory {
        #[serde(default)]
        root: Option<String>,
    },
}

impl FileSystemConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Instantiate every configured adapter, in order.
    pub fn build(&self) -> FileSystem {
        let mut fs = FileSystem::new();
        for adapter in &self.adapters {
            match &adapter.kind {
                AdapterKind::Local { root, read_only } => {
                    if *read_only {
                        fs.add_adapter(LocalAdapter::read_only(&adapter.prefix, root));
                    } else {
                        fs.add_adapter(LocalAdapter::new(&adapter.prefix, root));
                    }
                }
                AdapterKind::Memory { root } => match root {
                    Some(root) => fs.add_adapter(MemoryAdapter::with_root(&adapter.prefix, root)),
                    None => fs.add_adapter(MemoryAdapter::new(&adapter.prefix)),
                },
            }
            tracing::debug!(prefix = %adapter.prefix, "registered adapter from config");
        }
        fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[[adapters]]
prefix = "files"
kind = "local"
root = "/srv/data"

[[adapters]]
prefix = "ro"
kind = "local"
root = "/srv/archive"
read_only = true

[[adapters]]
prefix = "scratch"
kind = "memory"
"#;

    #[test]
    fn parses_adapters_in_order() {
        let config = FileSystemConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.adapters.len(), 3);
        assert_eq!(
            config.adapters[0],
            AdapterConfig {
                prefix: "files".into(),
                kind: AdapterKind::Local {
                    root: "/srv/data".into(),
                    read_only: false,
                },
            }
        );
        assert_eq!(
            config.adapters[1].kind,
            AdapterKind::Local {
                root: "/srv/archive".into(),
                read_only: true,
            }
        );
        assert_eq!(config.adapters[2].kind, AdapterKind::Memory { root: None });
    }

    #[test]
    fn build_registers_every_adapter() {
        let fs = FileSystemConfig::from_toml_str(SAMPLE).unwrap().build();
        assert_eq!(fs.prefixes(), vec!["files", "ro", "scratch"]);
        assert_eq!(fs.get_adapter("files").unwrap().root_path(), "/srv/data");
    }

    #[test]
    fn empty_config_is_valid() {
        let config = FileSystemConfig::from_toml_str("").unwrap();
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = FileSystemConfig::from_toml_str(
            "[[adapters]]\nprefix = \"x\"\nkind = \"ftp\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = FileSystemConfig::load(file.path()).unwrap();
        assert_eq!(config.adapters.len(), 3);
    }

    #[test]
    fn load_missing_file() {
        let err = FileSystemConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
