//! Mapping between local files and remote paths on the hosting account.
//!
//! Remote paths are always absolute and `/`-separated, whatever the local
//! platform uses. A local file at `<local_root>/a/b/c` maps to
//! `<remote_root>/a/b/c`.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("{} is not inside the local root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("cannot map {} to a remote path: only plain path segments are allowed", .0.display())]
    UnsupportedComponent(PathBuf),

    #[error("remote path must not be empty")]
    EmptyRemotePath,

    #[error("{} is not valid UTF-8 and has no remote name", .0.display())]
    NonUtf8(PathBuf),
}

/// Normalise a remote path: leading `/` added, trailing `/` removed.
/// The account root `/` normalises to `/`.
pub fn normalise_remote_path(remote_path: &str) -> Result<String, PathError> {
    let trimmed = remote_path.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyRemotePath);
    }
    let body = trimmed.trim_matches('/');
    Ok(format!("/{body}"))
}

/// Join `relative` (a path relative to the local root) onto `remote_root`.
pub fn remote_join(remote_root: &str, relative: &Path) -> Result<String, PathError> {
    let mut remote = normalise_remote_path(remote_root)?;
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                if !remote.ends_with('/') {
                    remote.push('/');
                }
                let segment = segment
                    .to_str()
                    .ok_or_else(|| PathError::NonUtf8(relative.to_path_buf()))?;
                remote.push_str(segment);
            }
            Component::CurDir => {}
            _ => return Err(PathError::UnsupportedComponent(relative.to_path_buf())),
        }
    }
    Ok(remote)
}

/// The path of `path` relative to `root`, purely lexically.
pub fn relative_to(root: &Path, path: &Path) -> Result<PathBuf, PathError> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| PathError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })
}

/// Remote path for `local_file` obtained by substituting the `local_root`
/// prefix with `remote_root`.
pub fn map_to_remote(
    local_root: &Path,
    remote_root: &str,
    local_file: &Path,
) -> Result<String, PathError> {
    let relative = relative_to(local_root, local_file)?;
    remote_join(remote_root, &relative)
}

/// Parent directory of a remote path, `None` for the account root.
pub fn remote_parent(remote_path: &str) -> Option<&str> {
    let trimmed = remote_path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&trimmed[..idx]),
    }
}
