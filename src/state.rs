//! Console preferences and session flags persisted between runs.
//!
//! Loaded explicitly at startup and written through on every change, so
//! nothing in the library reads ambient global state.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const STATE_FILE: &str = "state.json";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("HOME environment variable not set")]
    NoHome,
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("State file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the terminal/system preference.
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" => Ok(Theme::Auto),
            other => Err(format!("unknown theme '{}', expected light, dark or auto", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleState {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub current_user: Option<String>,
    /// Overrides the configured API base URL when set.
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConsoleState {
    /// Light and dark swap; auto resolves to dark.
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = match self.theme {
            Theme::Light | Theme::Auto => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn mark_authenticated(&mut self, user: &str, token: Option<String>) {
        self.authenticated = true;
        self.current_user = Some(user.to_string());
        if token.is_some() {
            self.session_token = token;
        }
    }

    pub fn clear_session(&mut self) {
        self.authenticated = false;
        self.session_token = None;
        self.current_user = None;
    }
}

pub fn get_config_dir() -> Result<PathBuf, StateError> {
    let config_dir = if let Ok(custom_dir) = std::env::var("DIRCONSOLE_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| StateError::NoHome)?;
        PathBuf::from(home).join(".config").join("dirconsole")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_state() -> Result<ConsoleState, StateError> {
    load_state_from(&get_config_dir()?)
}

pub fn save_state(state: &mut ConsoleState) -> Result<(), StateError> {
    save_state_to(&get_config_dir()?, state)
}

/// Missing file means first run: defaults.
pub fn load_state_from(dir: &Path) -> Result<ConsoleState, StateError> {
    let state_file = dir.join(STATE_FILE);

    if !state_file.exists() {
        return Ok(ConsoleState::default());
    }

    let content = fs::read_to_string(state_file)?;
    let state: ConsoleState = serde_json::from_str(&content)?;
    Ok(state)
}

pub fn save_state_to(dir: &Path, state: &mut ConsoleState) -> Result<(), StateError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    state.updated_at = Some(Utc::now());

    let content = serde_json::to_string_pretty(state)?;
    fs::write(dir.join(STATE_FILE), content)?;
    tracing::debug!("Saved console state to {}", dir.display());
    Ok(())
}
