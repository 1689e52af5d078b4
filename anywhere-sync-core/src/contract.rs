//! # contract: the seam between push orchestration and the hosting API
//!
//! The push pipeline in [`crate::push`] talks to the remote account only through
//! the two traits defined here:
//!
//! - [`Uploader`]: write a file, create a directory, list a directory.
//! - [`Reloader`]: restart the hosted web application.
//!
//! The CLI crate provides the HTTP implementation; tests use the `mockall`
//! mocks (`MockUploader`, `MockReloader`), exported through the default
//! `test-export-mocks` feature so that downstream integration tests can use them too.
//!
//! All methods are async and return [`RemoteError`] so callers can tell an HTTP
//! rejection (with its status) apart from a transport failure.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure talking to the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The API answered with a status outside the accepted set.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The response arrived but could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Kind of a remote directory entry as reported by the files API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteEntryKind {
    File,
    Directory,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: RemoteEntryKind,
    /// API URL of the entry, when the server sent one.
    pub url: Option<String>,
}

/// Writes files into the hosting account.
///
/// Remote paths are absolute, `/`-separated paths on the account
/// (e.g. `/home/alice/site/app.py`).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Create or overwrite the file at `remote_path` with `content`.
    async fn upload_file(&self, remote_path: &str, content: Vec<u8>) -> Result<(), RemoteError>;

    /// Create the directory at `remote_path`.
    async fn create_directory(&self, remote_path: &str) -> Result<(), RemoteError>;

    /// List the entries of the directory at `remote_path`, sorted by name.
    async fn list_directory(&self, remote_path: &str) -> Result<Vec<RemoteEntry>, RemoteError>;
}

/// Restarts the hosted web application so it picks up new files.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Reloader: Send + Sync {
    async fn reload_web_app(&self) -> Result<(), RemoteError>;
}
