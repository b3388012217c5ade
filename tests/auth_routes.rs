mod common;

use axum::http::{StatusCode, header};
use serde_json::json;
use std::time::Duration;

use bookswap::security::TokenService;
use common::{TEST_SECRET, spawn_app};

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let resp = app.send("GET", "/health", None, None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!({"status": "ok"}));
}

#[tokio::test]
async fn register_then_login_issues_a_token() {
    let app = spawn_app().await;
    let (register_token, family_id) = app.register("alice", "alice@x.com", "pw123").await;
    assert!(!register_token.is_empty());
    assert_eq!(family_id, 1);

    let resp = app.login("alice", "pw123").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["token_type"], "bearer");
    let token = resp.body["access_token"].as_str().expect("token");
    assert!(!token.is_empty());

    let me = app.send("GET", "/auth/me", Some(token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "alice");
    assert_eq!(me.body["email"], "alice@x.com");
    assert_eq!(me.body["family_id"], family_id);
    assert!(me.body.get("hashed_password").is_none());
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let app = spawn_app().await;
    app.register("alice", "alice@x.com", "pw123").await;

    let dup_name = app
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"username": "alice", "email": "other@x.com", "password": "pw"})),
        )
        .await;
    assert_eq!(dup_name.status, StatusCode::BAD_REQUEST);
    assert_eq!(dup_name.body["error"]["code"], "CONFLICT");

    let dup_email = app
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"username": "bob", "email": "alice@x.com", "password": "pw"})),
        )
        .await;
    assert_eq!(dup_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(dup_email.body["error"]["message"], "Email already registered");

    let missing = app
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"username": "carol"})),
        )
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"]["code"], "VALIDATION_ERROR");

    let bad_email = app
        .send(
            "POST",
            "/auth/register",
            None,
            Some(json!({"username": "dave", "email": "nope", "password": "pw"})),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    app.register("alice", "alice@x.com", "pw123").await;

    for (user, pw) in [("alice", "wrong"), ("nobody", "pw123")] {
        let resp = app.login(user, pw).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
        assert_eq!(
            resp.body["error"]["message"],
            "Incorrect username or password"
        );
    }
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let app = spawn_app().await;
    app.register("alice", "alice@x.com", "pw123").await;

    let missing = app.send("GET", "/books", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        missing.headers.get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let garbage = app.send("GET", "/books", Some("not.a.token"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    let foreign = TokenService::new(
        b"another-secret-another-secret-another".to_vec(),
        Duration::from_secs(60),
    )
    .expect("service")
    .issue_now("alice")
    .expect("token");
    let forged = app.send("GET", "/books", Some(&foreign), None).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_or_orphaned_tokens_are_unauthorized() {
    let app = spawn_app().await;
    app.register("alice", "alice@x.com", "pw123").await;
    let tokens =
        TokenService::new(TEST_SECRET.as_bytes().to_vec(), Duration::from_secs(60)).expect("svc");

    let expired = tokens.issue("alice", 1_000).expect("token");
    let resp = app.send("GET", "/auth/me", Some(&expired), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let ghost = tokens.issue_now("ghost").expect("token");
    let resp = app.send("GET", "/auth/me", Some(&ghost), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_users_are_forbidden() {
    let app = spawn_app().await;
    let (admin, _) = app.register("admin", "admin@x.com", "pw").await;
    let (bob_token, _) = app.register("bob", "bob@x.com", "pw").await;

    let me = app.send("GET", "/auth/me", Some(&bob_token), None).await;
    let bob_id = me.body["id"].as_i64().expect("id");

    let resp = app
        .send(
            "PUT",
            &format!("/users/{bob_id}"),
            Some(&admin),
            Some(json!({"is_active": false})),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["is_active"], false);

    let denied = app.send("GET", "/books", Some(&bob_token), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["error"]["code"], "INACTIVE_USER");

    let login = app.login("bob", "pw").await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);
}
