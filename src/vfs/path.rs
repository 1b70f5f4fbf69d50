//! Path resolution: turns a raw `/`-delimited string into an ordered
//! sequence of traversal steps.
//!
//! The self- and parent-entries (`""`, `.`, `..`) are not stored in the
//! tree; they become [`Step::Stay`] and [`Step::Up`] here, so child maps
//! hold real directories only.

/// One traversal step of a resolved path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step<'a> {
    /// Stay at the current node (`""` or `.`).
    Stay,
    /// Move to the parent node (`..`); a no-op at the root.
    Up,
    /// Descend into the named child directory.
    Down(&'a str),
}

/// Resolves `raw` into steps, as seen from a node `depth` levels below the
/// root.
///
/// An empty string resolves to an empty sequence ("this node"). A leading
/// separator is rewritten as `depth` parent steps followed by the remainder,
/// so absolute paths resolve to the same node regardless of where the
/// resolution starts. Consecutive separators yield [`Step::Stay`].
///
/// Nothing is rejected here; the calling operation validates the shape of
/// the result.
pub fn resolve(raw: &str, depth: usize) -> Vec<Step<'_>> {
    if raw.is_empty() {
        return Vec::new();
    }
    let (mut steps, rest) = match raw.strip_prefix('/') {
        Some(rest) => (vec![Step::Up; depth], rest),
        None => (Vec::new(), raw),
    };
    if !rest.is_empty() {
        for segment in rest.split('/') {
            steps.push(match segment {
                "" | "." => Step::Stay,
                ".." => Step::Up,
                name => Step::Down(name),
            });
        }
    }
    steps
}

/// Resolves a path naming a directory. Trailing separators are trimmed
/// first, so `a/b/` and `a/b` name the same directory.
pub fn resolve_dir(raw: &str, depth: usize) -> Vec<Step<'_>> {
    resolve(raw.trim_end_matches('/'), depth)
}

/// Resolves a path naming a file. Unlike directories, a trailing separator
/// is an error here: a file name cannot be empty.
pub fn resolve_file(raw: &str, depth: usize) -> crate::Result<Vec<Step<'_>>> {
    if raw.is_empty() || raw.ends_with('/') {
        return Err(crate::VfsError::InvalidPath {
            path: raw.to_string(),
        });
    }
    Ok(resolve(raw, depth))
}
