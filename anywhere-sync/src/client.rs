#![doc = "HTTP client for the PythonAnywhere API, implementing the core Uploader and Reloader traits."]
//
//! # PythonAnywhere client (CLI <-> Core)
//!
//! This module is the bridge between the push pipeline in
//! [`anywhere_sync_core::push`] and the vendor's REST API. [`AnywhereClient`]
//! implements [`Uploader`] and [`Reloader`] on top of `reqwest`.
//!
//! ## Client Usage
//!
//! - Construct with [`AnywhereClient::new_from_env`] (reads
//!   `PYTHONANYWHERE_API_TOKEN`, `PYTHONANYWHERE_USERNAME` and the optional
//!   host/domain overrides), or [`AnywhereClient::new`] with explicit values.
//! - Every request carries `Authorization: Token <api_token>`.
//! - Endpoints live under `<host>/api/v0/user/<username>/`:
//!   - `files/path<remote>`: `POST` multipart `content` to write a file,
//!     `POST {"operation": "mkdir"}` to create a directory, `GET` to list.
//!   - `webapps/<domain>/reload/`: `POST` to reload the web app.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{multipart, Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::collections::BTreeMap;

use anywhere_sync_core::contract::{
    RemoteEntry, RemoteEntryKind, RemoteError, Reloader, Uploader,
};
use anywhere_sync_core::credentials::{ApiEndpoint, Credentials};

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

pub struct AnywhereClient {
    http: Client,
    api_base: Url,
    webapp_domain: String,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    #[serde(rename = "type")]
    kind: RemoteEntryKind,
    #[serde(default)]
    url: Option<String>,
}

impl AnywhereClient {
    pub fn new(credentials: &Credentials, endpoint: &ApiEndpoint) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Token {}", credentials.api_token))
            .context("API token contains characters that are not allowed in an HTTP header")?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("anywhere-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let mut api_base = Url::parse(&endpoint.host)
            .with_context(|| format!("Invalid API host {:?}", endpoint.host))?;
        api_base
            .path_segments_mut()
            .map_err(|_| anyhow!("API host {:?} cannot be used as a base URL", endpoint.host))?
            .pop_if_empty()
            .extend(["api", "v0", "user", credentials.username.as_str()]);

        tracing::info!(
            api_base = %api_base,
            webapp_domain = %endpoint.webapp_domain,
            "Initialized AnywhereClient"
        );
        Ok(Self {
            http,
            api_base,
            webapp_domain: endpoint.webapp_domain.clone(),
        })
    }

    pub fn new_from_env() -> Result<Self> {
        let credentials = Credentials::from_env()?;
        let endpoint = ApiEndpoint::from_env(&credentials.username);
        Self::new(&credentials, &endpoint)
    }

    /// URL of the files endpoint for `remote_path`; `trailing_slash` marks a directory.
    pub fn files_url(&self, remote_path: &str, trailing_slash: bool) -> Url {
        let mut segments = vec!["files", "path"];
        segments.extend(remote_path.split('/').filter(|s| !s.is_empty()));
        if trailing_slash {
            segments.push("");
        }
        self.endpoint(&segments)
    }

    pub fn reload_url(&self) -> Url {
        self.endpoint(&["webapps", self.webapp_domain.as_str(), "reload", ""])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        // api_base was checked to be a base URL in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }
}

async fn expect_status(response: Response, accepted: &[StatusCode]) -> Result<Response, RemoteError> {
    let status = response.status();
    if accepted.contains(&status) {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

#[async_trait]
impl Uploader for AnywhereClient {
    async fn upload_file(&self, remote_path: &str, content: Vec<u8>) -> Result<(), RemoteError> {
        let url = self.files_url(remote_path, false);
        let file_name = remote_path
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("content")
            .to_string();
        tracing::info!(remote_path, bytes = content.len(), "Uploading file to PythonAnywhere");

        let form = multipart::Form::new().part("content", multipart::Part::bytes(content).file_name(file_name));
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, remote_path, "Transport error uploading file");
                transport(e)
            })?;

        match expect_status(response, &[StatusCode::OK, StatusCode::CREATED]).await {
            Ok(response) => {
                tracing::info!(remote_path, status = response.status().as_u16(), "Successfully uploaded file");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, remote_path, "API rejected file upload");
                Err(e)
            }
        }
    }

    async fn create_directory(&self, remote_path: &str) -> Result<(), RemoteError> {
        let url = self.files_url(remote_path, false);
        tracing::debug!(remote_path, "Creating remote directory");
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "operation": "mkdir" }))
            .send()
            .await
            .map_err(transport)?;
        expect_status(response, &[StatusCode::OK, StatusCode::CREATED]).await?;
        tracing::info!(remote_path, "Created remote directory");
        Ok(())
    }

    async fn list_directory(&self, remote_path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        let url = self.files_url(remote_path, true);
        tracing::info!(remote_path, "Listing remote directory");
        let response = self.http.get(url).send().await.map_err(transport)?;
        let response = expect_status(response, &[StatusCode::OK]).await?;
        let listing: BTreeMap<String, ListingEntry> = response.json().await.map_err(|e| {
            tracing::error!(error = %e, remote_path, "Failed to decode directory listing");
            RemoteError::Decode(e.to_string())
        })?;
        tracing::info!(count = listing.len(), remote_path, "Fetched directory listing");
        Ok(listing
            .into_iter()
            .map(|(name, entry)| RemoteEntry {
                name,
                kind: entry.kind,
                url: entry.url,
            })
            .collect())
    }
}

#[async_trait]
impl Reloader for AnywhereClient {
    async fn reload_web_app(&self) -> Result<(), RemoteError> {
        tracing::info!(webapp_domain = %self.webapp_domain, "Reloading web app");
        let response = self
            .http
            .post(self.reload_url())
            .send()
            .await
            .map_err(transport)?;
        match expect_status(response, &[StatusCode::OK]).await {
            Ok(_) => {
                tracing::info!(webapp_domain = %self.webapp_domain, "Successfully reloaded web app");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, webapp_domain = %self.webapp_domain, "Failed to reload web app");
                Err(e)
            }
        }
    }
}
