use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::state::{load_state, save_state, Theme};

#[derive(Subcommand)]
pub enum ThemeCommands {
    #[command(about = "Show the current theme")]
    Show,

    #[command(about = "Switch between light and dark")]
    Toggle,

    #[command(about = "Set the theme explicitly")]
    Set {
        #[arg(help = "light, dark or auto")]
        theme: Theme,
    },
}

pub async fn handle(cmd: ThemeCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut state = load_state()?;

    let message = match cmd {
        ThemeCommands::Show => format!("Theme: {}", state.theme.as_str()),
        ThemeCommands::Toggle => {
            let theme = state.toggle_theme();
            save_state(&mut state)?;
            format!("Theme switched to {}", theme.as_str())
        }
        ThemeCommands::Set { theme } => {
            state.set_theme(theme);
            save_state(&mut state)?;
            format!("Theme set to {}", theme.as_str())
        }
    };

    output_success(&output_format, &message, Some(json!({ "theme": state.theme })))
}
