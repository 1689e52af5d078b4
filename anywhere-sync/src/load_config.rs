/// `load_config` module: reads and writes the JSON settings file behind `configure`.
///
/// This is the only place where the settings file is parsed or written. The
/// parsed [`SyncConfig`] is handed to each command as a plain value.
///
/// # Behaviour
/// - A missing file is not an error: defaults are returned, matching a fresh
///   project that has not been configured yet.
/// - A file that exists but cannot be read or parsed is an error.
/// - Saving overwrites the whole file with pretty-printed JSON.
///
/// # Errors
/// All errors use `anyhow::Error` with context and surface at the CLI boundary.
use anyhow::{Context, Result};
use anywhere_sync_core::config::SyncConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Settings file used when neither `--config` nor `ANYWHERE_SYNC_CONFIG` is given.
pub const DEFAULT_CONFIG_FILE: &str = ".anywhere-sync.json";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading settings from file");

    if !path_ref.exists() {
        info!(config_path = ?path_ref, "No settings file yet, using defaults");
        return Ok(SyncConfig::default());
    }

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read settings file");
            return Err(anyhow::anyhow!(
                "Failed to read settings file {}: {}",
                path_ref.display(),
                e
            ));
        }
    };

    let config: SyncConfig = match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse settings JSON");
            return Err(anyhow::anyhow!(
                "Failed to parse settings JSON in {}: {e}",
                path_ref.display()
            ));
        }
    };

    config.trace_loaded();
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &SyncConfig) -> Result<()> {
    let path_ref = path.as_ref();
    if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(config).context("Failed to serialise settings")?;
    fs::write(path_ref, json + "\n")
        .with_context(|| format!("Failed to write settings file {}", path_ref.display()))?;
    info!(config_path = ?path_ref, "Settings saved");
    Ok(())
}
