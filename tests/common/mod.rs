#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use directory_console::client::DirectoryClient;

pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "stub-session";
/// Existence checks in this OU answer after [`SLOW_DELAY`].
pub const SLOW_OU: &str = "lent";
pub const SLOW_DELAY: Duration = Duration::from_millis(400);

/// In-memory directory answering the console's API routes.
#[derive(Default)]
pub struct StubDirectory {
    pub taken: Mutex<HashSet<String>>,
    pub checks: Mutex<Vec<(String, String)>>,
    pub created: Mutex<Vec<Value>>,
    pub deleted: Mutex<Vec<Value>>,
    pub moved: Mutex<Vec<Value>>,
    pub fail_checks: AtomicBool,
    pub malformed_checks: AtomicBool,
}

impl StubDirectory {
    pub fn take(&self, full_identifier: &str) {
        self.taken.lock().unwrap().insert(full_identifier.to_string());
    }

    pub fn check_count(&self) -> usize {
        self.checks.lock().unwrap().len()
    }

    pub fn checked_identifiers(&self) -> Vec<String> {
        self.checks.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn fail_checks(&self) {
        self.fail_checks.store(true, Ordering::SeqCst);
    }

    pub fn malform_checks(&self) {
        self.malformed_checks.store(true, Ordering::SeqCst);
    }
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub directory: Arc<StubDirectory>,
}

impl TestServer {
    pub fn client(&self) -> DirectoryClient {
        DirectoryClient::new(&self.base_url, Duration::from_secs(5)).expect("valid stub URL")
    }

    pub fn authenticated_client(&self) -> DirectoryClient {
        self.client().with_auth_token(TOKEN)
    }
}

/// Start a fresh stub directory on an unused port for the calling test.
pub async fn spawn_directory() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);
    let directory = Arc::new(StubDirectory::default());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind stub directory")?;
    let app = router(Arc::clone(&directory));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        port,
        base_url,
        directory,
    })
}

fn router(directory: Arc<StubDirectory>) -> Router {
    Router::new()
        .route("/api/check_login_name", get(check_login_name))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/check_auth", get(check_auth))
        .route("/api/search_user", get(search_user))
        .route("/api/search_manager", get(search_manager))
        .route("/api/search_group", get(search_group))
        .route("/api/create_user", post(create_user))
        .route("/api/delete_user", post(delete_user))
        .route("/api/apply_changes", post(apply_changes))
        .route("/api/get_user_ou", get(get_user_ou))
        .route("/api/get_user_site_ous", get(get_user_site_ous))
        .route("/api/get_office365_ous", get(get_office365_ous))
        .with_state(directory)
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|cookies| cookies.contains(&format!("authToken={}", TOKEN)))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Not authenticated" }))).into_response()
}

async fn check_login_name(
    State(directory): State<Arc<StubDirectory>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let login = params.get("loginName").cloned().unwrap_or_default();
    let ou = params.get("ou").cloned().unwrap_or_default();
    directory.checks.lock().unwrap().push((login.clone(), ou.clone()));
    if ou == SLOW_OU {
        tokio::time::sleep(SLOW_DELAY).await;
    }

    if directory.fail_checks.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "LDAP unavailable", "details": "connection refused" })),
        )
            .into_response();
    }
    if directory.malformed_checks.load(Ordering::SeqCst) {
        return (StatusCode::OK, "not json").into_response();
    }

    let exists = directory.taken.lock().unwrap().contains(&login);
    Json(json!({ "exists": exists })).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" }))).into_response();
    }
    (
        [(SET_COOKIE, format!("authToken={}; Path=/; HttpOnly", TOKEN))],
        Json(json!({ "message": "Login successful" })),
    )
        .into_response()
}

async fn logout() -> Response {
    Json(json!({ "message": "Logged out" })).into_response()
}

async fn check_auth(headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    Json(json!({ "authenticated": true, "user": "admin" })).into_response()
}

async fn search_user(Query(params): Query<HashMap<String, String>>) -> Response {
    let query = params.get("query").cloned().unwrap_or_default().to_lowercase();
    let users: Vec<Value> = [
        "CN=Jean Dupont,OU=administratifs,OU=Paris,DC=example,DC=com",
        "CN=Marie Durand,OU=enseignants,OU=Lyon,DC=example,DC=com",
    ]
    .into_iter()
    .filter(|dn| dn.to_lowercase().contains(&query))
    .map(|dn| json!({ "dn": dn }))
    .collect();
    Json(users).into_response()
}

async fn search_manager(Query(params): Query<HashMap<String, String>>) -> Response {
    let query = params.get("query").cloned().unwrap_or_default();
    Json(json!({
        "managers": [{ "dn": format!("CN={},OU=direction,DC=example,DC=com", query), "cn": query }]
    }))
    .into_response()
}

async fn search_group(Query(params): Query<HashMap<String, String>>) -> Response {
    let query = params.get("query").cloned().unwrap_or_default();
    Json(json!({
        "groups": [{ "dn": format!("CN={},OU=GROUPS,DC=example,DC=com", query), "cn": query }]
    }))
    .into_response()
}

async fn create_user(
    State(directory): State<Arc<StubDirectory>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let login_name = body["loginName"].clone();
    directory.created.lock().unwrap().push(body);
    Json(json!({
        "message": "User created successfully",
        "password": "Xk4#pL9!qW2z",
        "loginName": login_name
    }))
    .into_response()
}

async fn delete_user(
    State(directory): State<Arc<StubDirectory>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    if body["dn"].as_str().map(str::is_empty).unwrap_or(true) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing dn" }))).into_response();
    }
    directory.deleted.lock().unwrap().push(body);
    Json(json!({ "message": "User disabled" })).into_response()
}

async fn apply_changes(
    State(directory): State<Arc<StubDirectory>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let missing = ["dn", "new_ou", "main_ou"]
        .iter()
        .any(|key| body[*key].as_str().map(str::is_empty).unwrap_or(true));
    if missing {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "DN, new OU et main OU requis" }))).into_response();
    }
    directory.moved.lock().unwrap().push(body);
    Json(json!({ "message": "Modifications appliquées" })).into_response()
}

/// Site of an account: the last `OU=` component of its DN.
fn site_of(dn: &str) -> Option<String> {
    dn.split(',')
        .filter_map(|part| part.trim().strip_prefix("OU="))
        .last()
        .map(str::to_string)
}

fn site_ous(site: &str) -> Vec<&'static str> {
    match site {
        "Paris" => vec!["administratifs", "enseignants", "vacataires"],
        "Lyon" => vec!["administratifs", "enseignants"],
        _ => Vec::new(),
    }
}

async fn get_user_ou(Query(params): Query<HashMap<String, String>>) -> Response {
    let dn = params.get("dn").cloned().unwrap_or_default();
    Json(json!({ "ou": site_of(&dn) })).into_response()
}

async fn get_user_site_ous(Query(params): Query<HashMap<String, String>>) -> Response {
    let dn = params.get("dn").cloned().unwrap_or_default();
    let ous = site_of(&dn).map(|site| site_ous(&site)).unwrap_or_default();
    Json(json!({ "office365_ous": ous })).into_response()
}

async fn get_office365_ous(Query(params): Query<HashMap<String, String>>) -> Response {
    let site = params.get("site").cloned().unwrap_or_default();
    Json(json!({ "office365_ous": site_ous(&site) })).into_response()
}
