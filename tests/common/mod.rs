#![allow(dead_code)]

use axum::body::Body;
use gatehouse::db;
use gatehouse::models::invite::InviteCode;
use gatehouse::rate_limit::RateLimiter;
use gatehouse::routes;
use gatehouse::state::{AppState, VerifyPolicy};
use gatehouse::token::TokenIssuer;
use http::{Method, Request};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ADMIN_TOKEN: &str = "test-admin-credential";
pub const JWT_SECRET: &str = "test-jwt-signing-secret";
pub const ISSUER: &str = "https://blog.example";
pub const ALLOWED_ORIGIN: &str = "https://blog.example";

/// Test server that owns its own database and full AppState.
/// Each instance is isolated — safe for parallel tests.
pub struct TestServer {
    pub state: AppState,
    db_file: Option<PathBuf>,
}

/// Path for a throwaway SQLite database in the temp directory.
pub fn temp_db_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{prefix}-{}.db", uuid::Uuid::new_v4()))
}

/// Remove a database file together with its WAL and shared-memory files.
pub fn remove_db_files(path: &Path) {
    let _ = std::fs::remove_file(path);
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(sidecar));
    }
}

impl TestServer {
    /// Create a new TestServer with an in-memory SQLite database.
    pub async fn new() -> Self {
        Self::with_database_url("sqlite::memory:", None).await
    }

    /// Create a TestServer backed by a fresh database file, for tests that
    /// need real concurrent writers.
    pub async fn with_file_db() -> Self {
        let path = temp_db_path("gatehouse-test");
        let url = format!("sqlite:{}?mode=rwc", path.display());
        Self::with_database_url(&url, Some(path)).await
    }

    async fn with_database_url(url: &str, db_file: Option<PathBuf>) -> Self {
        let pool = db::create_pool(url)
            .await
            .expect("failed to create test pool");

        let state = AppState {
            db: pool,
            rate_limiter: RateLimiter::new(),
            verify_policy: VerifyPolicy {
                limit: 100,
                window: Duration::from_secs(60),
            },
            tokens: TokenIssuer::new(Some(JWT_SECRET.to_string()), ISSUER),
            admin_token: Some(ADMIN_TOKEN.to_string()),
            allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
            trusted_proxy_hops: 1,
            expose_errors: false,
        };

        Self { state, db_file }
    }

    pub fn with_verify_limit(mut self, limit: u32) -> Self {
        self.state.verify_policy.limit = limit;
        self
    }

    pub fn with_jwt_secret(mut self, secret: Option<&str>) -> Self {
        self.state.tokens = TokenIssuer::new(secret.map(str::to_string), ISSUER);
        self
    }

    pub fn with_admin_token(mut self, token: Option<&str>) -> Self {
        self.state.admin_token = token.map(str::to_string);
        self
    }

    pub fn with_exposed_errors(mut self) -> Self {
        self.state.expose_errors = true;
        self
    }

    /// Returns an Axum Router wired to this server's state for `oneshot()` calls.
    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    /// Backing database file, if this server is not in-memory.
    pub fn db_file(&self) -> Option<&Path> {
        self.db_file.as_deref()
    }

    /// Returns a reference to the underlying SQLite pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.state.db
    }

    /// Insert an unused invite code directly into the store.
    pub async fn create_invite(&self, code: &str) -> InviteCode {
        db::invites::create(self.pool(), code)
            .await
            .expect("failed to create test invite")
    }

    pub async fn invite(&self, code: &str) -> Option<InviteCode> {
        db::invites::get(self.pool(), code)
            .await
            .expect("failed to read test invite")
    }

    pub async fn all_invites(&self) -> Vec<InviteCode> {
        db::invites::list_all(self.pool())
            .await
            .expect("failed to list test invites")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(path) = self.db_file.take() {
            remove_db_files(&path);
        }
    }
}

// ---------------------------------------------------------------------------
// Request builder helpers
// ---------------------------------------------------------------------------

/// Build a `POST /verify-invite` request for the given code, from the given client address.
pub fn verify_request(code: &serde_json::Value, client_ip: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/verify-invite")
        .header("Content-Type", "application/json")
        .header("X-Forwarded-For", client_ip)
        .body(Body::from(
            serde_json::to_vec(&serde_json::json!({ "code": code })).unwrap(),
        ))
        .unwrap()
}

/// Build an admin request with an optional JSON body.
pub fn admin_request(
    method: Method,
    auth_header: Option<&str>,
    body: Option<&serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri("/admin/invites");
    if let Some(auth) = auth_header {
        builder = builder.header("Authorization", auth);
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// The `Authorization` header value carrying the test admin credential.
pub fn admin_auth() -> String {
    format!("Bearer {ADMIN_TOKEN}")
}

/// Build a request with no body.
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Parse a response body into a `serde_json::Value`.
pub async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
