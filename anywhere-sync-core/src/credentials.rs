//! Credentials and API endpoint, read from the environment.
//!
//! Nothing here is ever written to disk. The CLI loads a `.env` file into the
//! process environment first, so both sources end up behind the same lookup.

use std::fmt;
use thiserror::Error;
use tracing::{error, info};

pub const TOKEN_VAR: &str = "PYTHONANYWHERE_API_TOKEN";
pub const USERNAME_VAR: &str = "PYTHONANYWHERE_USERNAME";
pub const API_HOST_VAR: &str = "PYTHONANYWHERE_API_HOST";
pub const WEBAPP_DOMAIN_VAR: &str = "PYTHONANYWHERE_WEBAPP_DOMAIN";

pub const DEFAULT_API_HOST: &str = "https://www.pythonanywhere.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("{0} is not set (export it or add it to .env)")]
    Missing(&'static str),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_token: String,
    pub username: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = required(&lookup, TOKEN_VAR)?;
        let username = required(&lookup, USERNAME_VAR)?;
        info!(username = %username, api_token_set = !api_token.is_empty(), "Credentials loaded");
        Ok(Self {
            api_token,
            username,
        })
    }
}

/// Where the API lives and which web app to reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    /// Scheme and host, without trailing slash, e.g. `https://eu.pythonanywhere.com`.
    pub host: String,
    pub webapp_domain: String,
}

impl ApiEndpoint {
    pub fn from_env(username: &str) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), username)
    }

    pub fn from_lookup<F>(lookup: F, username: &str) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = optional(&lookup, API_HOST_VAR)
            .map(|h| h.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_HOST.to_string());
        let webapp_domain = optional(&lookup, WEBAPP_DOMAIN_VAR)
            .unwrap_or_else(|| format!("{username}.pythonanywhere.com"));
        Self {
            host,
            webapp_domain,
        }
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, CredentialsError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| {
        error!(var = key, "Required environment variable missing");
        CredentialsError::Missing(key)
    })
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_token_and_username() {
        let creds =
            Credentials::from_lookup(lookup(&[(TOKEN_VAR, "abc123"), (USERNAME_VAR, "alice")]))
                .unwrap();
        assert_eq!(creds.api_token, "abc123");
        assert_eq!(creds.username, "alice");
        assert!(!format!("{creds:?}").contains("abc123"));
    }

    #[test]
    fn missing_or_blank_values_are_errors() {
        let err = Credentials::from_lookup(lookup(&[(USERNAME_VAR, "alice")])).unwrap_err();
        assert_eq!(err, CredentialsError::Missing(TOKEN_VAR));

        let err = Credentials::from_lookup(lookup(&[(TOKEN_VAR, "t"), (USERNAME_VAR, "  ")]))
            .unwrap_err();
        assert_eq!(err, CredentialsError::Missing(USERNAME_VAR));
    }

    #[test]
    fn endpoint_defaults_and_overrides() {
        let default = ApiEndpoint::from_lookup(lookup(&[]), "alice");
        assert_eq!(default.host, DEFAULT_API_HOST);
        assert_eq!(default.webapp_domain, "alice.pythonanywhere.com");

        let eu = ApiEndpoint::from_lookup(
            lookup(&[
                (API_HOST_VAR, "https://eu.pythonanywhere.com/"),
                (WEBAPP_DOMAIN_VAR, "www.example.org"),
            ]),
            "alice",
        );
        assert_eq!(eu.host, "https://eu.pythonanywhere.com");
        assert_eq!(eu.webapp_domain, "www.example.org");
    }
}
