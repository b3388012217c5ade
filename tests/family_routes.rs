mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn registration_creates_a_family_named_after_the_user() {
    let app = spawn_app().await;
    let (token, family_id) = app.register("alice", "alice@x.com", "pw").await;

    let family = app
        .send("GET", &format!("/families/{family_id}"), Some(&token), None)
        .await;
    assert_eq!(family.status, StatusCode::OK);
    assert_eq!(
        family.body,
        json!({"id": family_id, "name": "alice", "email": "alice@x.com"})
    );
}

#[tokio::test]
async fn standalone_family_crud() {
    let app = spawn_app().await;
    let (token, _) = app.register("alice", "alice@x.com", "pw").await;

    let created = app
        .send(
            "POST",
            "/families",
            Some(&token),
            Some(json!({"name": "Garcia", "email": "garcia@x.com"})),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["id"].as_i64().expect("id");

    let renamed = app
        .send(
            "PUT",
            &format!("/families/{id}"),
            Some(&token),
            Some(json!({"name": "Garcia-Lopez"})),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["name"], "Garcia-Lopez");
    assert_eq!(renamed.body["email"], "garcia@x.com");

    let list = app
        .send("GET", "/families?limit=10", Some(&token), None)
        .await;
    assert_eq!(list.body.as_array().expect("array").len(), 2);

    let first = app
        .send("DELETE", &format!("/families/{id}"), Some(&token), None)
        .await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);
    let second = app
        .send("DELETE", &format!("/families/{id}"), Some(&token), None)
        .await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn family_books_lists_only_owned_books() {
    let app = spawn_app().await;
    let (token, alice) = app.register("alice", "alice@x.com", "pw").await;
    let (_, bob) = app.register("bob", "bob@x.com", "pw").await;
    app.create_book(&token, "mine", alice).await;
    app.create_book(&token, "his", bob).await;

    let books = app
        .send("GET", &format!("/families/{alice}/books"), Some(&token), None)
        .await;
    assert_eq!(books.status, StatusCode::OK);
    let books = books.body.as_array().expect("array");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "mine");

    let missing = app
        .send("GET", "/families/999/books", Some(&token), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn families_with_members_cannot_be_deleted() {
    let app = spawn_app().await;
    let (token, alice) = app.register("alice", "alice@x.com", "pw").await;

    let resp = app
        .send("DELETE", &format!("/families/{alice}"), Some(&token), None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"]["code"], "INVALID_REFERENCE");
}
