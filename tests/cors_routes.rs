mod common;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};

use bookswap::config::Config;
use common::{TestApp, spawn_app, spawn_app_with};

async fn get_with_origin(app: &TestApp, origin: &str) -> HeaderMap {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .expect("failed to build request");
    let resp = app.request(request).await;
    assert_eq!(resp.status, StatusCode::OK);
    resp.headers
}

async fn preflight(app: &TestApp, origin: &str) -> HeaderMap {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/books")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .expect("failed to build request");
    let resp = app.request(request).await;
    assert_eq!(resp.status, StatusCode::OK);
    resp.headers
}

#[tokio::test]
async fn no_configured_origins_allows_any() {
    let app = spawn_app().await;

    let headers = get_with_origin(&app, "http://anywhere.test").await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let headers = preflight(&app, "http://anywhere.test").await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
}

#[tokio::test]
async fn configured_origins_restrict_and_skip_invalid_entries() {
    let app = spawn_app_with(Config {
        cors_allow_origins: vec![
            "http://localhost:3000".to_string(),
            "http://bad\norigin".to_string(),
        ],
        ..Config::default()
    })
    .await;

    let headers = get_with_origin(&app, "http://localhost:3000").await;
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let headers = preflight(&app, "http://localhost:3000").await;
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let headers = get_with_origin(&app, "http://evil.test").await;
    assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let headers = preflight(&app, "http://evil.test").await;
    assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
