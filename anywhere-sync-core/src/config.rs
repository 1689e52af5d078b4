use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::filter::{ExclusionFilter, FilterError};

/// Patterns excluded when no settings file exists yet.
pub const DEFAULT_EXCLUDED: [&str; 4] = [".git", "__pycache__", "*.pyc", ".env"];

/// Persisted sync settings: which local tree mirrors which remote directory,
/// what to leave out, and whether to reload the web app after a push.
///
/// Field names on disk are `local_root_dir`, `remote_root_dir`,
/// `excluded_paths` and `auto_reload`. Empty directory strings read as unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    #[serde(rename = "local_root_dir", deserialize_with = "empty_as_none")]
    pub local_dir: Option<PathBuf>,
    #[serde(rename = "remote_root_dir", deserialize_with = "empty_as_none")]
    pub remote_dir: Option<String>,
    #[serde(rename = "excluded_paths")]
    pub excluded: Vec<String>,
    pub auto_reload: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            local_dir: None,
            remote_dir: None,
            excluded: DEFAULT_EXCLUDED.iter().map(|p| p.to_string()).collect(),
            auto_reload: true,
        }
    }
}

/// Changes requested by `configure`; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub local_dir: Option<PathBuf>,
    pub remote_dir: Option<String>,
    pub excluded: Option<Vec<String>>,
    pub auto_reload: Option<bool>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ConfigUpdate::default()
    }
}

impl SyncConfig {
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(local_dir) = update.local_dir {
            self.local_dir = Some(local_dir);
        }
        if let Some(remote_dir) = update.remote_dir {
            self.remote_dir = Some(remote_dir);
        }
        if let Some(excluded) = update.excluded {
            self.excluded = excluded;
        }
        if let Some(auto_reload) = update.auto_reload {
            self.auto_reload = auto_reload;
        }
    }

    pub fn exclusion_filter(&self) -> Result<ExclusionFilter, FilterError> {
        ExclusionFilter::new(&self.excluded)
    }

    pub fn trace_loaded(&self) {
        info!(
            local_dir = ?self.local_dir,
            remote_dir = ?self.remote_dir,
            excluded_count = self.excluded.len(),
            auto_reload = self.auto_reload,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(T::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_exclude_common_python_clutter() {
        let config = SyncConfig::default();
        assert!(config.auto_reload);
        assert_eq!(config.excluded, vec![".git", "__pycache__", "*.pyc", ".env"]);
        assert!(config.local_dir.is_none() && config.remote_dir.is_none());
    }

    #[test]
    fn update_only_touches_given_fields() {
        let mut config = SyncConfig::default();
        config.apply(ConfigUpdate {
            remote_dir: Some("/home/u/site".into()),
            auto_reload: Some(false),
            ..Default::default()
        });
        assert_eq!(config.remote_dir.as_deref(), Some("/home/u/site"));
        assert!(!config.auto_reload);
        assert_eq!(config.excluded.len(), DEFAULT_EXCLUDED.len());

        config.apply(ConfigUpdate {
            excluded: Some(vec![]),
            ..Default::default()
        });
        assert!(config.excluded.is_empty());
        assert_eq!(config.remote_dir.as_deref(), Some("/home/u/site"));
    }

    #[test]
    fn empty_directory_strings_read_as_unset() {
        let json = r#"{"local_root_dir": "", "remote_root_dir": "/home/u/x", "excluded_paths": ["*.log"], "auto_reload": false}"#;
        let config: SyncConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.local_dir, None);
        assert_eq!(config.remote_dir.as_deref(), Some("/home/u/x"));
        assert_eq!(config.excluded, vec!["*.log"]);
        assert!(!config.auto_reload);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{"remote_root_dir": "/r"}"#).unwrap();
        assert!(config.auto_reload);
        assert_eq!(config.excluded.len(), DEFAULT_EXCLUDED.len());
    }
}
