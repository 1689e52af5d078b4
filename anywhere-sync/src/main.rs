use anyhow::Result;
use anywhere_sync::cli::{run, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Logs go to stderr so stdout only carries the command's own output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Credentials may come from a .env in the working directory.
    let dotenv_path = dotenvy::dotenv().ok();
    init_tracing();
    if let Some(path) = dotenv_path {
        tracing::debug!(env_file = %path.display(), "Loaded environment file");
    }

    let cli = Cli::parse();
    tracing::debug!(config_path = %cli.config.display(), command = ?cli.command, "Dispatching command");
    run(cli).await.inspect_err(|e| {
        tracing::debug!(error = %e, "Command failed");
    })
}
