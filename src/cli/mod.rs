pub mod commands;
pub mod utils;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::DirectoryClient;
use crate::config::config;
use crate::state::ConsoleState;

#[derive(Parser)]
#[command(name = "dirconsole")]
#[command(about = "Directory console - onboarding and offboarding of directory accounts")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login handle allocation and availability checks")]
    Handle {
        #[command(subcommand)]
        cmd: commands::handle::HandleCommands,
    },

    #[command(about = "Authentication against the directory API")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Search, create and remove directory accounts")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Console theme preference")]
    Theme {
        #[command(subcommand)]
        cmd: commands::theme::ThemeCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Client for the configured API, or the server saved in the console state,
/// carrying the stored session token when there is one.
pub fn directory_client(state: &ConsoleState) -> anyhow::Result<DirectoryClient> {
    let api = &config().api;
    let base_url = state.server_url.as_deref().unwrap_or(&api.base_url);
    let client = DirectoryClient::new(base_url, api.request_timeout())?;

    Ok(match &state.session_token {
        Some(token) => client.with_auth_token(token.clone()),
        None => client,
    })
}

/// Run the parsed command. Failures are reported here, in the selected
/// output format, and turned into a failing exit code.
pub async fn run(cli: Cli) -> ExitCode {
    let output_format = OutputFormat::from_cli(&cli);

    let result = match cli.command {
        Commands::Handle { cmd } => commands::handle::handle(cmd, output_format.clone()).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format.clone()).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format.clone()).await,
        Commands::Theme { cmd } => commands::theme::handle(cmd, output_format.clone()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let verbose = matches!(std::env::var("CLI_VERBOSE").as_deref(), Ok("true") | Ok("1"));
            utils::report_error(&output_format, &e, verbose);
            ExitCode::FAILURE
        }
    }
}
