//! Virtual path parsing and physical path normalization.
//!
//! A virtual path looks like `prefix://relative/path`. The prefix picks an
//! adapter; the relative part is joined onto that adapter's root path to
//! get the physical (backend-native) path. Everything here is pure string
//! manipulation with no I/O.

use crate::error::{FsError, Result};

/// Separator between the adapter prefix and the relative path.
pub const PREFIX_SEPARATOR: &str = "://";

/// Canonical root path.
pub const ROOT: &str = "/";

/// Split a virtual path into `(prefix, relative_path)`.
///
/// `"files://a/b.txt"` gives `("files", "a/b.txt")`, and `"files://"` gives
/// `("files", "")`, which addresses the adapter root. Backslashes in the
/// relative part are normalized to forward slashes.
pub fn resolve_prefix_and_path(virtual_path: &str) -> Result<(String, String)> {
    let Some((prefix, rest)) = virtual_path.split_once(PREFIX_SEPARATOR) else {
        return Err(FsError::PrefixNotFoundInPath {
            path: virtual_path.to_string(),
        });
    };

    if prefix.is_empty() {
        return Err(FsError::invalid_virtual_path(virtual_path, "empty prefix"));
    }

    let rest = rest.replace('\\', "/");
    if rest.contains(PREFIX_SEPARATOR) {
        return Err(FsError::invalid_virtual_path(
            virtual_path,
            format!("relative path must not contain '{PREFIX_SEPARATOR}'"),
        ));
    }

    Ok((prefix.to_string(), rest))
}

/// Normalize an adapter root path.
///
/// Empty and `/` map to [`ROOT`], backslashes become forward slashes and
/// trailing separators are removed.
pub fn normalize_root_path(root_path: &str) -> String {
    let normalized = root_path.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');

    if trimmed.is_empty() {
        ROOT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Join a relative path onto a (normalized) root path.
pub fn physical_path(relative_path: &str, root_path: &str) -> String {
    let relative = relative_path.trim_start_matches('/');

    if root_path == ROOT {
        relative.to_string()
    } else if relative.is_empty() {
        root_path.to_string()
    } else {
        format!("{root_path}/{relative}")
    }
}

/// Map a physical path back into the virtual namespace of `prefix`.
///
/// Fails with [`FsError::InvalidPath`] if the physical path already contains
/// the prefix separator: resolving it again would be ambiguous.
pub fn virtual_path(physical_path: &str, prefix: &str, root_path: &str) -> Result<String> {
    if physical_path.contains(PREFIX_SEPARATOR) {
        return Err(FsError::invalid_path(
            physical_path,
            format!("physical path must not contain '{PREFIX_SEPARATOR}'"),
        ));
    }

    let root = normalize_root_path(root_path);
    let path = physical_path.replace('\\', "/");

    let stripped = if root == ROOT {
        path.as_str()
    } else {
        match path.strip_prefix(root.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path.as_str(),
        }
    };

    Ok(format!(
        "{prefix}{PREFIX_SEPARATOR}{}",
        stripped.trim_start_matches('/')
    ))
}

/// Canonical form of an adapter-relative path: empty and `.` segments
/// dropped, joined with `/`. An empty result addresses the adapter root.
///
/// `..` is rejected with [`FsError::InvalidPath`] rather than resolved, so a
/// relative path can never name anything above the root.
pub fn clean_relative(relative: &str) -> Result<String> {
    let mut cleaned: Vec<&str> = Vec::new();
    for segment in relative.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return Err(FsError::invalid_path(relative, "path escapes adapter root")),
            s => cleaned.push(s),
        }
    }
    Ok(cleaned.join("/"))
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Everything but the last segment, joined with `/`.
///
/// `"/a/b/c"` gives `"a/b"`; zero or one segments give `""`.
pub fn parent_path(path: &str) -> String {
    let parts: Vec<&str> = segments(path).collect();
    match parts.split_last() {
        Some((_, parent)) => parent.join("/"),
        None => String::new(),
    }
}

/// The last non-empty segment, or `""` for an empty or root path.
pub fn last_segment(path: &str) -> String {
    segments(path).last().unwrap_or_default().to_string()
}

/// Join a relative directory and a child name without doubling separators.
pub fn join_relative(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
