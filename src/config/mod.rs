use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub login: LoginConfig,
    pub forms: FormConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Selectable domain suffixes; the first entry is the default selection.
    pub domains: Vec<String>,
    pub check_timeout_ms: u64,
    pub max_digit_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub default_ou: String,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl LoginConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn default_domain(&self) -> &str {
        self.domains.first().map(String::as_str).unwrap_or(DEFAULT_DOMAINS[0])
    }
}

pub const DEFAULT_DOMAINS: [&str; 2] = ["@example.com", "@test.example.com"];

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("DIRCONSOLE_API_URL") {
            if !v.trim().is_empty() {
                self.api.base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("DIRCONSOLE_REQUEST_TIMEOUT_MS") {
            self.api.request_timeout_ms = v.parse().unwrap_or(self.api.request_timeout_ms);
        }
        if let Ok(v) = env::var("DIRCONSOLE_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Login overrides
        if let Ok(v) = env::var("DIRCONSOLE_DOMAINS") {
            let domains = parse_domains(&v);
            if !domains.is_empty() {
                self.login.domains = domains;
            }
        }
        if let Ok(v) = env::var("DIRCONSOLE_CHECK_TIMEOUT_MS") {
            self.login.check_timeout_ms = v.parse().unwrap_or(self.login.check_timeout_ms);
        }
        if let Ok(v) = env::var("DIRCONSOLE_MAX_DIGIT_ATTEMPTS") {
            self.login.max_digit_attempts = v.parse().unwrap_or(self.login.max_digit_attempts);
        }

        // Form overrides
        if let Ok(v) = env::var("DIRCONSOLE_DEFAULT_OU") {
            if !v.trim().is_empty() {
                self.forms.default_ou = v.trim().to_string();
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:5000".to_string(),
                request_timeout_ms: 30_000,
                enable_request_logging: true,
            },
            login: LoginConfig {
                domains: default_domains(),
                check_timeout_ms: 5_000,
                max_digit_attempts: 30,
            },
            forms: FormConfig {
                default_ou: "administratifs".to_string(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.example.com".to_string(),
                request_timeout_ms: 10_000,
                enable_request_logging: true,
            },
            login: LoginConfig {
                domains: default_domains(),
                check_timeout_ms: 5_000,
                max_digit_attempts: 30,
            },
            forms: FormConfig {
                default_ou: "administratifs".to_string(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://console.example.com".to_string(),
                request_timeout_ms: 5_000,
                enable_request_logging: false,
            },
            login: LoginConfig {
                domains: default_domains(),
                check_timeout_ms: 3_000,
                max_digit_attempts: 30,
            },
            forms: FormConfig {
                default_ou: "administratifs".to_string(),
            },
        }
    }
}

fn default_domains() -> Vec<String> {
    DEFAULT_DOMAINS.iter().map(|d| d.to_string()).collect()
}

/// `example.com` and `@example.com` name the same suffix.
pub fn normalize_domain(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('@') {
        raw.to_string()
    } else {
        format!("@{}", raw)
    }
}

fn parse_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(normalize_domain)
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
