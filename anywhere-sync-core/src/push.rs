//! Push pipeline: local tree → remote account, then an optional web-app reload.
//!
//! - [`push_dir`] walks a local root, skips excluded paths and uploads every
//!   remaining file to the mirrored remote path.
//! - [`push_file`] uploads a single file to an explicit remote path.
//! - [`reload_after_push`] reloads the web app when the push succeeded and
//!   auto-reload is on.
//!
//! Everything runs sequentially: one request is awaited before the next one
//! starts, in the walker's enumeration order (sorted by file name).
//!
//! # Error Handling
//! Only problems that make the whole command meaningless are returned as
//! [`PushError`] (missing local root, bad remote path). A file that cannot be
//! read or uploaded is recorded in [`PushReport::failures`] and the walk goes
//! on. Directory creation and reload problems are warnings.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::contract::{Reloader, Uploader};
use crate::filter::ExclusionFilter;
use crate::paths::{normalise_remote_path, relative_to, remote_join, remote_parent, PathError};

#[derive(Debug, Error)]
pub enum PushError {
    #[error("local directory {} does not exist or is not a directory", .0.display())]
    MissingLocalDir(PathBuf),

    #[error("local file {} does not exist or is not a file", .0.display())]
    MissingLocalFile(PathBuf),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// What `push-dir` needs besides the filter and the uploader.
#[derive(Debug, Clone)]
pub struct PushDirRequest {
    pub local_root: PathBuf,
    pub remote_root: String,
    /// Create each remote subdirectory before uploading into it.
    pub create_dirs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub bytes: u64,
    /// Hex SHA-256 of the uploaded content.
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub local_path: PathBuf,
    pub remote_path: Option<String>,
    pub reason: String,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.remote_path {
            Some(remote) => write!(
                f,
                "{} -> {}: {}",
                self.local_path.display(),
                remote,
                self.reason
            ),
            None => write!(f, "{}: {}", self.local_path.display(), self.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryWarning {
    pub remote_path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Auto-reload is switched off in the configuration.
    Disabled,
    /// The push had failures, or no reload step ran yet.
    #[default]
    NotAttempted,
    Reloaded,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct PushReport {
    pub uploaded: Vec<UploadedFile>,
    /// Excluded paths, relative to the local root. Pruned directories appear once.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
    pub directory_warnings: Vec<DirectoryWarning>,
    pub reload: ReloadOutcome,
}

impl PushReport {
    /// True when no file failed. Warnings and reload problems do not count.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Upload every non-excluded file under `request.local_root`.
pub async fn push_dir<U>(
    request: &PushDirRequest,
    filter: &ExclusionFilter,
    uploader: &U,
) -> Result<PushReport, PushError>
where
    U: Uploader + ?Sized,
{
    let root = &request.local_root;
    if !root.is_dir() {
        error!(local_root = %root.display(), "[PUSH][ERROR] Local root is not a directory");
        return Err(PushError::MissingLocalDir(root.clone()));
    }
    let remote_root = normalise_remote_path(&request.remote_root)?;
    info!(
        local_root = %root.display(),
        remote_root = %remote_root,
        patterns = ?filter.patterns(),
        create_dirs = request.create_dirs,
        "[PUSH] Pushing directory"
    );

    let mut report = PushReport::default();
    let mut skipped = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if filter.is_excluded(relative) {
                debug!(path = %relative.display(), "[PUSH] Excluded");
                skipped.push(relative.to_path_buf());
                false
            } else {
                true
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let local_path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                error!(local_path = %local_path.display(), error = %e, "[PUSH][ERROR] Failed to read directory entry");
                report.failures.push(FileFailure {
                    local_path,
                    remote_path: None,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        let remote_path =
            match relative_to(root, entry.path()).and_then(|rel| remote_join(&remote_root, &rel)) {
                Ok(remote_path) => remote_path,
                Err(e) => {
                    error!(local_path = %entry.path().display(), error = %e, "[PUSH][ERROR] Cannot map path");
                    report.failures.push(FileFailure {
                        local_path: entry.path().to_path_buf(),
                        remote_path: None,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

        if entry.file_type().is_dir() {
            if request.create_dirs {
                ensure_directory(uploader, &remote_path, &mut report).await;
            }
            continue;
        }
        if entry.path().is_dir() {
            // symlinked directory; links are not followed
            debug!(local_path = %entry.path().display(), "[PUSH] Skipping directory symlink");
            continue;
        }

        upload_one(uploader, entry.path(), remote_path, &mut report).await;
    }

    report.skipped = skipped;
    info!(
        uploaded = report.uploaded.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "[PUSH] Directory push finished"
    );
    Ok(report)
}

/// Upload `local_file` to `remote_file`. Exclusion patterns do not apply.
pub async fn push_file<U>(
    local_file: &Path,
    remote_file: &str,
    create_dirs: bool,
    uploader: &U,
) -> Result<PushReport, PushError>
where
    U: Uploader + ?Sized,
{
    if !local_file.is_file() {
        error!(local_file = %local_file.display(), "[PUSH][ERROR] Local file does not exist");
        return Err(PushError::MissingLocalFile(local_file.to_path_buf()));
    }
    let remote_path = normalise_remote_path(remote_file)?;
    info!(local_file = %local_file.display(), remote_path = %remote_path, "[PUSH] Pushing file");

    let mut report = PushReport::default();
    if create_dirs {
        if let Some(parent) = remote_parent(&remote_path) {
            ensure_directory(uploader, parent, &mut report).await;
        }
    }
    upload_one(uploader, local_file, remote_path, &mut report).await;
    Ok(report)
}

/// Reload the web app if `auto_reload` is on and the push had no failures.
/// The outcome is stored in `report.reload`; it never turns into a failure.
pub async fn reload_after_push<R>(report: &mut PushReport, auto_reload: bool, reloader: &R)
where
    R: Reloader + ?Sized,
{
    report.reload = if !auto_reload {
        info!("[PUSH] Auto-reload disabled, not reloading");
        ReloadOutcome::Disabled
    } else if !report.is_success() {
        warn!(
            failed = report.failures.len(),
            "[PUSH] Push had failures, not reloading"
        );
        ReloadOutcome::NotAttempted
    } else {
        match reloader.reload_web_app().await {
            Ok(()) => {
                info!("[PUSH] Web app reloaded");
                ReloadOutcome::Reloaded
            }
            Err(e) => {
                warn!(error = %e, "[PUSH][WARN] Web app reload failed");
                ReloadOutcome::Failed(e.to_string())
            }
        }
    };
}

pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

async fn ensure_directory<U>(uploader: &U, remote_path: &str, report: &mut PushReport)
where
    U: Uploader + ?Sized,
{
    match uploader.create_directory(remote_path).await {
        Ok(()) => debug!(remote_path, "[PUSH] Remote directory ready"),
        Err(e) => {
            warn!(remote_path, error = %e, "[PUSH][WARN] Could not create remote directory");
            report.directory_warnings.push(DirectoryWarning {
                remote_path: remote_path.to_string(),
                reason: e.to_string(),
            });
        }
    }
}

async fn upload_one<U>(uploader: &U, local_path: &Path, remote_path: String, report: &mut PushReport)
where
    U: Uploader + ?Sized,
{
    let content = match std::fs::read(local_path) {
        Ok(content) => content,
        Err(e) => {
            error!(local_path = %local_path.display(), error = %e, "[PUSH][ERROR] Failed to read local file");
            report.failures.push(FileFailure {
                local_path: local_path.to_path_buf(),
                remote_path: Some(remote_path),
                reason: format!("read failed: {e}"),
            });
            return;
        }
    };
    let bytes = content.len() as u64;
    let sha256 = content_digest(&content);

    info!(local_path = %local_path.display(), remote_path = %remote_path, bytes, "[PUSH][UPLOAD] Uploading file");
    match uploader.upload_file(&remote_path, content).await {
        Ok(()) => {
            info!(remote_path = %remote_path, "[PUSH][UPLOAD] Upload succeeded");
            report.uploaded.push(UploadedFile {
                local_path: local_path.to_path_buf(),
                remote_path,
                bytes,
                sha256,
            });
        }
        Err(e) => {
            error!(local_path = %local_path.display(), remote_path = %remote_path, error = %e, "[PUSH][ERROR][UPLOAD] Upload failed");
            report.failures.push(FileFailure {
                local_path: local_path.to_path_buf(),
                remote_path: Some(remote_path),
                reason: e.to_string(),
            });
        }
    }
}
