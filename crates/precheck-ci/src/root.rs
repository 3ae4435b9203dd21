//! Project root discovery.

use std::path::{Component, Path, PathBuf};

use crate::error::{CheckError, Result};

/// Walk up from `start` until a directory containing `marker` is found.
///
/// Only existence is checked; the marker's content is never read. A relative
/// `start` is resolved against the current working directory first, and `.`
/// and `..` components are folded away lexically so the walk never visits a
/// directory below `start`.
pub fn find_project_root(start: &Path, marker: &str) -> Result<PathBuf> {
    let start = if start.is_absolute() {
        normalize(start)
    } else {
        normalize(&std::env::current_dir()?.join(start))
    };

    let mut candidate = start.as_path();
    loop {
        if candidate.join(marker).exists() {
            return Ok(candidate.to_path_buf());
        }
        match candidate.parent() {
            Some(parent) => candidate = parent,
            None => {
                return Err(CheckError::ProjectRootNotFound {
                    start,
                    marker: marker.to_string(),
                })
            }
        }
    }
}

/// Drop `.` and resolve `..` against the preceding component.
///
/// Symlinks are not followed, so `link/..` means the directory holding `link`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the filesystem root stays at the root.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
