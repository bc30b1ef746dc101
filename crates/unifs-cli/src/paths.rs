//! XDG locations for unifs.
//!
//! | Purpose | XDG Variable | Default | unifs Path |
//! |---------|--------------|---------|------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/unifs/config.toml` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Config directory: `$XDG_CONFIG_HOME/unifs`, falling back to
/// `~/.config/unifs`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("unifs")
}

/// Default config file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
