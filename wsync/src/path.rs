//! Path helpers shared by the engine and its clients.
//! Local paths are represented with camino, whereas paths sent to the
//! remote server or handed to the sync tool are plain strings.

pub use camino::{Utf8Component as Component, Utf8Path as FsPath, Utf8PathBuf as FsPathBuf};

/// Separator used in paths sent to the remote server
pub const REMOTE_SEPARATOR_STR: &str = "/";

/// Whether `c` separates path segments.
/// Both separators are accepted so that settings written on one platform keep
/// their meaning on another.
#[must_use]
pub fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// The last non-empty segment of `path`, ignoring trailing separators.
pub fn last_segment(path: &str) -> Option<&str> {
    path.split(is_separator).rev().find(|s| !s.is_empty())
}

/// Name of the remote folder mirroring the workspace at `root`
pub fn folder_name(root: &FsPath) -> Option<&str> {
    root.file_name().or_else(|| last_segment(root.as_str()))
}

/// Path of `path` relative to `root`, with the root prefix and leading separators
/// stripped and segments joined with [REMOTE_SEPARATOR_STR].
/// Returns `None` if `path` is not inside `root`.
pub fn remote_relative(root: &FsPath, path: &FsPath) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let segments: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(segments.join(REMOTE_SEPARATOR_STR))
}

/// Whether `path` is `ancestor` itself or lies below it
pub fn is_within(path: &FsPath, ancestor: &FsPath) -> bool {
    path.starts_with(ancestor)
}
