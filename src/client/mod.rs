pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::login::ExistenceCheck;
use models::*;

/// Name of the session cookie issued by `/api/login`.
pub const AUTH_COOKIE: &str = "authToken";

/// Typed client for the directory REST API.
///
/// Every consequential operation (account creation, password generation,
/// search, deletion) happens server-side; this client only shapes requests
/// and maps failures into [`ClientError`].
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl DirectoryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        // Trailing slash so that joined paths stay under any base path.
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url,
            auth_token: None,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Authenticate and keep the session cookie for later requests.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<String, ClientError> {
        let endpoint = "api/login";
        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.request(self.http.post(self.endpoint(endpoint)?)).json(&body).send().await?;
        let response = Self::check_status(response).await?;

        let token = response
            .cookies()
            .find(|c| c.name() == AUTH_COOKIE)
            .map(|c| c.value().to_string());

        let body: MessageResponse = Self::decode(endpoint, response).await?;
        let token = token.ok_or_else(|| ClientError::decode(endpoint, "response carried no session cookie"))?;

        tracing::info!("Logged in as {}", username.trim());
        self.auth_token = Some(token);
        Ok(body.message)
    }

    /// End the session. The local token is dropped even if the server call fails.
    pub async fn logout(&mut self) -> Result<String, ClientError> {
        let endpoint = "api/logout";
        let outcome = self.send_json::<MessageResponse>(endpoint, self.http.post(self.endpoint(endpoint)?)).await;
        self.auth_token = None;
        outcome.map(|body| body.message)
    }

    /// Session status; a 401 answer means "not authenticated", not an error.
    pub async fn check_auth(&self) -> Result<AuthStatus, ClientError> {
        let endpoint = "api/check_auth";
        match self.send_json::<AuthStatus>(endpoint, self.http.get(self.endpoint(endpoint)?)).await {
            Ok(status) => Ok(status),
            Err(ClientError::Unauthorized(reason)) => {
                tracing::debug!("Session rejected: {}", reason);
                Ok(AuthStatus::anonymous())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn check_login_name(&self, full_identifier: &str, ou: &str) -> Result<bool, ClientError> {
        let endpoint = "api/check_login_name";
        let mut url = self.endpoint(endpoint)?;
        url.query_pairs_mut()
            .append_pair("loginName", full_identifier)
            .append_pair("ou", ou);

        let body: ExistsResponse = self.send_json(endpoint, self.http.get(url)).await?;
        Ok(body.exists)
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<DirectoryEntry>, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = "api/search_user";
        self.send_json(endpoint, self.http.get(self.search_url(endpoint, query)?)).await
    }

    pub async fn search_managers(&self, query: &str) -> Result<Vec<NamedEntry>, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = "api/search_manager";
        let body: ManagersResponse = self.send_json(endpoint, self.http.get(self.search_url(endpoint, query)?)).await?;
        Ok(body.managers)
    }

    pub async fn search_groups(&self, query: &str) -> Result<Vec<NamedEntry>, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = "api/search_group";
        let body: GroupsResponse = self.send_json(endpoint, self.http.get(self.search_url(endpoint, query)?)).await?;
        Ok(body.groups)
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<CreateUserResponse, ClientError> {
        let endpoint = "api/create_user";
        tracing::info!("Creating account {}{} in {}", request.login_name, request.domain, request.new_ou);
        self.send_json(endpoint, self.http.post(self.endpoint(endpoint)?).json(request)).await
    }

    pub async fn delete_user(&self, request: &DeleteUserRequest) -> Result<String, ClientError> {
        let endpoint = "api/delete_user";
        tracing::info!(
            "Deleting {} (retention {}d {}m)",
            request.dn,
            request.retention_days,
            request.retention_minutes
        );
        let body: MessageResponse = self.send_json(endpoint, self.http.post(self.endpoint(endpoint)?).json(request)).await?;
        Ok(body.message)
    }

    /// Move an account to another OU or site.
    pub async fn apply_changes(&self, request: &TransferRequest) -> Result<String, ClientError> {
        let endpoint = "api/apply_changes";
        tracing::info!("Moving {} from {} to {}", request.dn, request.main_ou, request.new_ou);
        let body: MessageResponse = self.send_json(endpoint, self.http.post(self.endpoint(endpoint)?).json(request)).await?;
        Ok(body.message)
    }

    /// Main OU (site) of an account; `None` when the directory has none.
    pub async fn user_ou(&self, dn: &str) -> Result<Option<String>, ClientError> {
        let endpoint = "api/get_user_ou";
        let body: UserOuResponse = self.send_json(endpoint, self.http.get(self.param_url(endpoint, "dn", dn)?)).await?;
        Ok(body.ou.filter(|ou| !ou.trim().is_empty()))
    }

    /// OUs available under the site the account already belongs to.
    pub async fn user_site_ous(&self, dn: &str) -> Result<Vec<String>, ClientError> {
        let endpoint = "api/get_user_site_ous";
        let body: OuListResponse = self.send_json(endpoint, self.http.get(self.param_url(endpoint, "dn", dn)?)).await?;
        Ok(body.office365_ous)
    }

    pub async fn office365_ous(&self, site: &str) -> Result<Vec<String>, ClientError> {
        let site = site.trim();
        if site.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = "api/get_office365_ous";
        let body: OuListResponse = self.send_json(endpoint, self.http.get(self.param_url(endpoint, "site", site)?)).await?;
        Ok(body.office365_ous)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn search_url(&self, path: &str, query: &str) -> Result<Url, ClientError> {
        self.param_url(path, "query", query)
    }

    fn param_url(&self, path: &str, key: &str, value: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().append_pair(key, value);
        Ok(url)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(ACCEPT, "application/json");
        match &self.auth_token {
            Some(token) => builder.header(COOKIE, format!("{}={}", AUTH_COOKIE, token)),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, endpoint: &str, builder: RequestBuilder) -> Result<T, ClientError> {
        tracing::debug!("-> {}", endpoint);
        let response = self.request(builder).send().await?;
        let response = Self::check_status(response).await?;
        Self::decode(endpoint, response).await
    }

    async fn check_status(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.summary(),
            Err(_) => None,
        }
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        tracing::debug!("<- {} {}", status, message);
        if status == StatusCode::UNAUTHORIZED {
            Err(ClientError::Unauthorized(message))
        } else {
            Err(ClientError::status(status, message))
        }
    }

    async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ClientError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::decode(endpoint, e.to_string()))
    }
}

#[async_trait]
impl ExistenceCheck for DirectoryClient {
    async fn exists(&self, full_identifier: &str, scope: &str) -> Result<bool, ClientError> {
        self.check_login_name(full_identifier, scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = DirectoryClient::new("http://localhost:5000/console", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5000/console/");
        assert_eq!(
            client.endpoint("api/check_auth").unwrap().as_str(),
            "http://localhost:5000/console/api/check_auth"
        );
    }

    #[test]
    fn test_search_url_encodes_query() {
        let client = DirectoryClient::new("http://localhost:5000", Duration::from_secs(1)).unwrap();
        let url = client.search_url("api/search_user", "Du pont&co").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/search_user?query=Du+pont%26co");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = DirectoryClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_URL");
    }

    #[tokio::test]
    async fn test_empty_search_skips_request() {
        // Port 9 (discard) would fail fast if a request were made.
        let client = DirectoryClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        assert!(client.search_users("  ").await.unwrap().is_empty());
        assert!(client.search_groups("").await.unwrap().is_empty());
        assert!(client.search_managers("").await.unwrap().is_empty());
        assert!(client.office365_ous(" ").await.unwrap().is_empty());
    }
}
