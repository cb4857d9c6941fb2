//! Host path conventions.
//!
//! The host stores image paths either absolute or relative to the save file,
//! marked by a leading `//`. Paths may use either separator regardless of
//! the platform they were written on.

use std::path::{Component, Path, PathBuf};

/// Prefix marking a path relative to the save file's directory.
pub const RELATIVE_PREFIX: &str = "//";

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Whether a host path is save-file relative.
pub fn is_relative(filepath: &str) -> bool {
    filepath.starts_with(RELATIVE_PREFIX)
}

/// Last path segment, splitting on both separators.
pub fn host_basename(filepath: &str) -> &str {
    match filepath.rfind(is_separator) {
        Some(index) => &filepath[index + 1..],
        None => filepath,
    }
}

/// Resolve a host path to an absolute, lexically normalized path.
///
/// Relative paths resolve against `save_dir`; without one they resolve
/// against nothing and stay relative.
pub fn resolve_host_path(filepath: &str, save_dir: Option<&Path>) -> PathBuf {
    let resolved = match filepath.strip_prefix(RELATIVE_PREFIX) {
        Some(rest) => {
            let mut path = save_dir.map(Path::to_path_buf).unwrap_or_default();
            for segment in rest.split(is_separator).filter(|s| !s.is_empty()) {
                path.push(segment);
            }
            path
        }
        None => PathBuf::from(filepath),
    };
    normalize_lexically(&resolved)
}

/// Collapse `.` and `..` components without touching the file system.
///
/// Works for paths that no longer exist, such as a texture that was just
/// renamed away.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Replace the file name of a host path, keeping its directory portion and
/// its relative or absolute form.
pub fn rewrite_file_name(filepath: &str, new_name: &str) -> String {
    if let Some(rest) = filepath.strip_prefix(RELATIVE_PREFIX) {
        return match rest.rfind(is_separator) {
            Some(index) => format!("{RELATIVE_PREFIX}{}/{new_name}", &rest[..index]),
            None => format!("{RELATIVE_PREFIX}{new_name}"),
        };
    }
    match filepath.rfind(is_separator) {
        Some(index) => format!("{}{new_name}", &filepath[..=index]),
        None => new_name.to_string(),
    }
}
