#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

use bookswap::config::Config;
use bookswap::{BookswapState, bookswap_router};

pub const TEST_SECRET: &str = "test-secret-test-secret-test-secret-0001";

pub struct TestApp {
    pub router: Router,
    pub db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut p = self.db_path.clone().into_os_string();
            p.push(suffix);
            let _ = fs::remove_file(p);
        }
    }
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Config::default()).await
}

/// Like [`spawn_app`], keeping `base` settings other than storage and auth.
pub async fn spawn_app_with(base: Config) -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut db_path = std::env::temp_dir();
    db_path.push(format!(
        "bookswap-test-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));

    let cfg = Config {
        database_url: format!("sqlite:{}", db_path.display()),
        secret_key: TEST_SECRET.to_string(),
        bcrypt_cost: 4,
        ..base
    };
    let state = BookswapState::from_config(&cfg)
        .await
        .expect("failed to build state");
    let router = bookswap_router(state, &cfg.cors_allow_origins);

    TestApp { router, db_path }
}

impl TestApp {
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");
        self.request(request).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/auth/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "grant_type=password&username={username}&password={password}"
            )))
            .expect("failed to build request");
        self.request(request).await
    }

    /// Registers a user and returns `(access_token, family_id)`.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> (String, i64) {
        let resp = self
            .send(
                "POST",
                "/auth/register",
                None,
                Some(json!({"username": username, "email": email, "password": password})),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "register failed: {}", resp.body);
        (
            resp.body["access_token"]
                .as_str()
                .expect("access_token")
                .to_string(),
            resp.body["family_id"].as_i64().expect("family_id"),
        )
    }

    pub async fn create_book(&self, token: &str, title: &str, owner_id: i64) -> i64 {
        let resp = self
            .send(
                "POST",
                "/books",
                Some(token),
                Some(json!({"title": title, "author": "Anon", "owner_id": owner_id})),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "create book failed: {}", resp.body);
        resp.body["id"].as_i64().expect("book id")
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        let resp = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        Response {
            status,
            headers,
            body,
        }
    }
}
