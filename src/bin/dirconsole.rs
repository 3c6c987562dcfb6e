use std::process::ExitCode;

use clap::Parser;
use directory_console::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present so DIRCONSOLE_* settings apply to local runs.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = directory_console::config::config();
    tracing::debug!("Using {} in {:?} mode", config.api.base_url, config.environment);

    let cli = Cli::parse();

    directory_console::cli::run(cli).await
}
