use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{directory_client, OutputFormat};
use crate::state::{load_state, save_state};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the directory API")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut state = load_state()?;

    match cmd {
        AuthCommands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };

            let mut client = directory_client(&state)?;
            let message = client.login(&username, &password).await?;

            state.mark_authenticated(username.trim(), client.auth_token().map(str::to_string));
            save_state(&mut state)?;

            output_success(&output_format, &message, Some(json!({ "user": username.trim() })))
        }

        AuthCommands::Logout => {
            let mut client = directory_client(&state)?;
            let outcome = client.logout().await;

            // Forget the session locally whatever the server said.
            state.clear_session();
            save_state(&mut state)?;

            let message = outcome?;
            output_success(&output_format, &message, None)
        }

        AuthCommands::Status => {
            let client = directory_client(&state)?;
            let status = client.check_auth().await?;

            if !status.authenticated && state.authenticated {
                tracing::info!("Stored session is no longer valid");
                state.clear_session();
                save_state(&mut state)?;
            }

            let message = match (status.authenticated, &status.user) {
                (true, Some(user)) => format!("Authenticated as {}", user),
                (true, None) => "Authenticated".to_string(),
                (false, _) => "Not authenticated".to_string(),
            };
            output_success(&output_format, &message, Some(json!({ "auth": status })))
        }
    }
}

fn prompt_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
