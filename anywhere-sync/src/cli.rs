///
/// This module implements the CLI interface for anywhere-sync: command
/// parsing, per-command handlers, and user-visible output.
///
/// All decisions about what gets uploaded where live in the
/// [`anywhere-sync-core`] crate; this module resolves CLI flags against the
/// stored settings, builds the HTTP client and prints the outcome.
///
/// ## How To Use
/// - For command-line users: run the `anywhere-sync` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`],
///   or call a handler directly with mock uploader/reloader implementations.
///
/// [`anywhere-sync-core`]: ../../anywhere_sync_core/
use crate::client::AnywhereClient;
use crate::load_config::{load_config, save_config, DEFAULT_CONFIG_FILE};
use anyhow::{Context, Result};
use anywhere_sync_core::config::{ConfigUpdate, SyncConfig};
use anywhere_sync_core::contract::{RemoteEntry, RemoteEntryKind, Reloader, Uploader};
use anywhere_sync_core::paths::map_to_remote;
use anywhere_sync_core::push::{
    push_dir, push_file, reload_after_push, PushDirRequest, PushReport, ReloadOutcome,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI for anywhere-sync: push local files to PythonAnywhere.
#[derive(Parser, Debug)]
#[clap(
    name = "anywhere-sync",
    version,
    about = "Push local files to a PythonAnywhere account and reload the web app"
)]
pub struct Cli {
    /// Settings file written by `configure` and read by the other commands
    #[clap(long, global = true, env = "ANYWHERE_SYNC_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store the local/remote directories, exclusions and the auto-reload flag
    Configure(ConfigureArgs),
    /// Upload every non-excluded file under the local directory
    PushDir(PushDirArgs),
    /// Upload a single file
    PushFile(PushFileArgs),
    /// List a remote directory
    List(ListArgs),
}

#[derive(Args, Debug, Default)]
pub struct ConfigureArgs {
    /// Local root directory (stored as an absolute path)
    #[clap(long)]
    pub local_dir: Option<PathBuf>,

    /// Remote root directory on PythonAnywhere
    #[clap(long)]
    pub remote_dir: Option<String>,

    /// Exclusion glob patterns; give the flag without values to clear the list
    #[clap(long, num_args = 0..)]
    pub excluded: Option<Vec<String>>,

    /// Reload the web app after a successful push
    #[clap(long, action = ArgAction::Set, value_name = "true|false")]
    pub auto_reload: Option<bool>,
}

#[derive(Args, Debug, Default)]
pub struct PushDirArgs {
    /// Local directory to push (default: configured local directory)
    #[clap(long)]
    pub local_dir: Option<PathBuf>,

    /// Remote directory (default: configured remote directory)
    #[clap(long)]
    pub remote_dir: Option<String>,

    /// Do not create remote directories before uploading into them
    #[clap(long)]
    pub no_create_dirs: bool,
}

#[derive(Args, Debug)]
pub struct PushFileArgs {
    /// Local file to push
    pub local_file: PathBuf,

    /// Remote file path (default: same path relative to the configured remote directory)
    #[clap(long)]
    pub remote_file: Option<String>,

    /// Do not create the remote parent directory first
    #[clap(long)]
    pub no_create_dirs: bool,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Remote directory to list (default: configured remote directory)
    pub remote_dir: Option<String>,
}

/// CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let loaded = load_config(&cli.config);

    match cli.command {
        Commands::Configure(args) => {
            configure(&cli.config, config_for_configure(&cli.config, loaded), args)?;
            Ok(())
        }
        Commands::PushDir(args) => {
            let config = loaded?;
            let client = AnywhereClient::new_from_env()?;
            tracing::info!(command = "push-dir", "Starting directory push");
            let report = push_dir_command(&config, args, &client, &client).await?;
            ensure_success(&report)
        }
        Commands::PushFile(args) => {
            let config = loaded?;
            let client = AnywhereClient::new_from_env()?;
            tracing::info!(command = "push-file", "Starting file push");
            let report = push_file_command(&config, args, &client, &client).await?;
            ensure_success(&report)
        }
        Commands::List(args) => {
            let config = loaded?;
            let client = AnywhereClient::new_from_env()?;
            list_command(&config, args, &client).await?;
            Ok(())
        }
    }
}

/// `configure` rewrites the whole file, so an unreadable one is replaced
/// starting from the defaults.
fn config_for_configure(path: &Path, loaded: Result<SyncConfig>) -> SyncConfig {
    loaded.unwrap_or_else(|e| {
        tracing::warn!(config_path = %path.display(), error = %e, "Discarding unreadable settings file");
        SyncConfig::default()
    })
}

/// Apply `args` to `config`, validate the result and write it to `path`.
pub fn configure(path: &Path, mut config: SyncConfig, args: ConfigureArgs) -> Result<SyncConfig> {
    let local_dir = match args.local_dir {
        Some(dir) => Some(
            std::path::absolute(&dir)
                .with_context(|| format!("Cannot resolve local directory {}", dir.display()))?,
        ),
        None => None,
    };
    let update = ConfigUpdate {
        local_dir,
        remote_dir: args.remote_dir,
        excluded: args.excluded,
        auto_reload: args.auto_reload,
    };
    if update.is_empty() {
        tracing::info!("configure called without changes, rewriting current settings");
    }
    config.apply(update);
    config
        .exclusion_filter()
        .context("Refusing to save invalid exclusion patterns")?;

    save_config(path, &config)?;
    println!("Configuration saved to {}", path.display());
    Ok(config)
}

pub async fn push_dir_command<U, R>(
    config: &SyncConfig,
    args: PushDirArgs,
    uploader: &U,
    reloader: &R,
) -> Result<PushReport>
where
    U: Uploader + ?Sized,
    R: Reloader + ?Sized,
{
    let local_root = args
        .local_dir
        .or_else(|| config.local_dir.clone())
        .context("Local directory not set: pass --local-dir or run `configure --local-dir`")?;
    let remote_root = args
        .remote_dir
        .or_else(|| config.remote_dir.clone())
        .context("Remote directory not set: pass --remote-dir or run `configure --remote-dir`")?;
    let filter = config
        .exclusion_filter()
        .context("Invalid exclusion patterns in settings")?;

    println!(
        "Pushing directory {} to {}",
        local_root.display(),
        remote_root
    );
    let request = PushDirRequest {
        local_root,
        remote_root,
        create_dirs: !args.no_create_dirs,
    };
    let mut report = push_dir(&request, &filter, uploader).await?;
    reload_after_push(&mut report, config.auto_reload, reloader).await;
    print_report(&report);
    Ok(report)
}

pub async fn push_file_command<U, R>(
    config: &SyncConfig,
    args: PushFileArgs,
    uploader: &U,
    reloader: &R,
) -> Result<PushReport>
where
    U: Uploader + ?Sized,
    R: Reloader + ?Sized,
{
    let remote_file = match args.remote_file {
        Some(remote_file) => remote_file,
        None => default_remote_path(config, &args.local_file)?,
    };
    println!("Pushing file {} to {}", args.local_file.display(), remote_file);
    let mut report = push_file(&args.local_file, &remote_file, !args.no_create_dirs, uploader).await?;
    reload_after_push(&mut report, config.auto_reload, reloader).await;
    print_report(&report);
    Ok(report)
}

pub async fn list_command<U>(
    config: &SyncConfig,
    args: ListArgs,
    uploader: &U,
) -> Result<Vec<RemoteEntry>>
where
    U: Uploader + ?Sized,
{
    let remote_dir = args
        .remote_dir
        .or_else(|| config.remote_dir.clone())
        .context("Remote directory not set: pass one or run `configure --remote-dir`")?;
    let entries = uploader
        .list_directory(&remote_dir)
        .await
        .with_context(|| format!("Failed to list {remote_dir}"))?;
    for entry in &entries {
        let marker = match entry.kind {
            RemoteEntryKind::Directory => "d",
            RemoteEntryKind::File => "f",
        };
        println!("{marker} {}", entry.name);
    }
    Ok(entries)
}

/// Remote path for `local_file` under the configured roots.
fn default_remote_path(config: &SyncConfig, local_file: &Path) -> Result<String> {
    let (Some(local_root), Some(remote_root)) = (&config.local_dir, &config.remote_dir) else {
        anyhow::bail!(
            "Pass --remote-file, or run `configure --local-dir ... --remote-dir ...` first"
        );
    };
    let local_file = fs::canonicalize(local_file)
        .with_context(|| format!("Local file {} does not exist", local_file.display()))?;
    let local_root = fs::canonicalize(local_root)
        .or_else(|_| std::path::absolute(local_root))
        .with_context(|| format!("Cannot resolve local directory {}", local_root.display()))?;
    map_to_remote(&local_root, remote_root, &local_file)
        .context("Cannot derive the remote path; pass --remote-file")
}

fn print_report(report: &PushReport) {
    for uploaded in &report.uploaded {
        println!(
            "Uploaded {} -> {}",
            uploaded.local_path.display(),
            uploaded.remote_path
        );
    }
    for warning in &report.directory_warnings {
        eprintln!(
            "warning: could not create {}: {}",
            warning.remote_path, warning.reason
        );
    }
    for failure in &report.failures {
        eprintln!("error: {failure}");
    }
    match &report.reload {
        ReloadOutcome::Reloaded => println!("Web app reloaded"),
        ReloadOutcome::Failed(reason) => eprintln!("warning: web app reload failed: {reason}"),
        ReloadOutcome::NotAttempted if !report.is_success() => {
            eprintln!("Web app not reloaded because some uploads failed")
        }
        ReloadOutcome::NotAttempted | ReloadOutcome::Disabled => {}
    }
    println!(
        "{} uploaded, {} skipped, {} failed",
        report.uploaded.len(),
        report.skipped.len(),
        report.failures.len()
    );
}

fn ensure_success(report: &PushReport) -> Result<()> {
    if report.is_success() {
        return Ok(());
    }
    anyhow::bail!(
        "{} of {} file(s) failed to upload",
        report.failures.len(),
        report.failures.len() + report.uploaded.len()
    )
}
