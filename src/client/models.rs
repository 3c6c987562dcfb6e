// Request and response bodies of the directory API.
// Field names follow the wire format, hence the mixed casing renames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<String>,
}

impl AuthStatus {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            user: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// Search hit carrying only a distinguished name (`/api/search_user`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub dn: String,
}

/// Search hit with a display name (`/api/search_manager`, `/api/search_group`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub dn: String,
    pub cn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagersResponse {
    #[serde(default)]
    pub managers: Vec<NamedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupsResponse {
    #[serde(default)]
    pub groups: Vec<NamedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "new_ou")]
    pub new_ou: String,
    pub new_description: String,
    pub new_office: String,
    pub new_phone_number: String,
    pub login_name: String,
    pub domain: String,
    pub manager_dn: String,
    pub member_of: Vec<String>,
    pub site: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub message: String,
    pub password: String,
    pub login_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    pub dn: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub retention_days: u32,
    pub retention_minutes: u32,
}

/// Internal move of an existing account to another OU or site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub dn: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "new_ou")]
    pub new_ou: String,
    #[serde(rename = "main_ou")]
    pub main_ou: String,
    pub new_description: String,
    pub new_office: String,
    pub new_phone_number: String,
    pub login_name: String,
    pub domain: String,
    pub manager_dn: String,
    pub member_of: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserOuResponse {
    #[serde(default)]
    pub ou: Option<String>,
}

/// OU list of `/api/get_office365_ous` and `/api/get_user_site_ous`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OuListResponse {
    #[serde(default)]
    pub office365_ous: Vec<String>,
}

/// Error body returned by the API alongside a non-success status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl ErrorBody {
    pub fn summary(&self) -> Option<String> {
        let headline = self.error.clone().or_else(|| self.message.clone())?;
        match &self.details {
            Some(Value::String(details)) => Some(format!("{} ({})", headline, details)),
            Some(Value::Null) | None => Some(headline),
            Some(details) => Some(format!("{} ({})", headline, details)),
        }
    }
}
