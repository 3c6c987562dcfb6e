use std::sync::Arc;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{directory_client, OutputFormat};
use crate::client::DirectoryClient;
use crate::config::{config, normalize_domain};
use crate::login::{AllocatorPolicy, HandleAllocator, LoginField, LoginStatus, ThreadDigits};
use crate::state::load_state;

#[derive(Subcommand)]
pub enum HandleCommands {
    #[command(about = "Propose the shortest free login for a person")]
    Allocate {
        #[arg(long, help = "Given name")]
        first: String,
        #[arg(long, help = "Family name")]
        last: String,
        #[arg(long, help = "Target organizational unit (defaults to the configured OU)")]
        ou: Option<String>,
        #[arg(long, help = "Domain suffix, e.g. @example.com")]
        domain: Option<String>,
    },

    #[command(about = "Check whether a login already exists in an OU")]
    Check {
        #[arg(help = "Login handle, with or without domain suffix")]
        login_name: String,
        #[arg(long, help = "Organizational unit to search")]
        ou: String,
        #[arg(long, help = "Domain suffix appended when the login has none")]
        domain: Option<String>,
    },
}

pub type ConsoleLoginField = LoginField<Arc<DirectoryClient>, ThreadDigits>;

/// Login field backed by the live directory, with limits from the config.
pub fn login_field(client: DirectoryClient) -> ConsoleLoginField {
    let login = &config().login;
    let allocator = HandleAllocator::with_policy(Arc::new(client), ThreadDigits, AllocatorPolicy::from_config(login));
    LoginField::from_config(allocator, login)
}

pub async fn handle(cmd: HandleCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = load_state()?;
    let client = directory_client(&state)?;

    match cmd {
        HandleCommands::Allocate { first, last, ou, domain } => {
            let field = Arc::new(login_field(client));
            let driver = field.auto_refresh();
            if let Some(domain) = domain {
                field.select_domain(&domain)?;
            }
            field.set_names(&first, &last);
            field.set_scope(ou.as_deref().unwrap_or(&config().forms.default_ou));

            let snapshot = field.settled().await;
            driver.abort();

            match &snapshot.status {
                LoginStatus::Ready => output_success(
                    &output_format,
                    &format!("Proposed login: {}{}", snapshot.handle, snapshot.domain),
                    Some(json!({ "login": snapshot })),
                ),
                LoginStatus::Failed(reason) => Err(anyhow::anyhow!("Login allocation failed: {}", reason)),
                LoginStatus::Idle | LoginStatus::Pending => {
                    Err(anyhow::anyhow!("Login allocation needs a first name, a last name and an OU"))
                }
            }
        }

        HandleCommands::Check { login_name, ou, domain } => {
            let login_name = login_name.trim();
            let full = if login_name.contains('@') {
                login_name.to_string()
            } else {
                let domain = match domain {
                    Some(domain) => normalize_domain(&domain),
                    None => config().login.default_domain().to_string(),
                };
                format!("{}{}", login_name, domain)
            };

            let exists = client.check_login_name(&full, ou.trim()).await?;
            let message = if exists {
                format!("{} already exists in {}", full, ou.trim())
            } else {
                format!("{} is available in {}", full, ou.trim())
            };
            output_success(
                &output_format,
                &message,
                Some(json!({ "loginName": full, "ou": ou.trim(), "exists": exists })),
            )
        }
    }
}
