//! Registration and login flows against the in-memory store.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{app, get, login, post, register};

#[tokio::test]
async fn registration_returns_created_user_without_password() {
    let app = app();

    let body = register(&app, "Alice Example", "alice", "open sesame 1").await;
    assert_eq!(body["success"], json!(true));

    let data = &body["data"];
    assert_eq!(data["name"], "Alice Example");
    assert_eq!(data["username"], "alice");
    assert_eq!(data["role"], "ROLE_USER");
    assert!(data["id"].as_str().is_some(), "expected generated id");
    assert!(data.get("password").is_none());
    assert!(data.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = app();
    register(&app, "Alice", "alice", "open sesame 1").await;

    let (status, body) = post(
        &app,
        "/notes-api/users",
        None,
        &json!({ "name": "Impostor", "username": "alice", "password": "open sesame 2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "The provided username is already in use");
}

#[tokio::test]
async fn registration_validates_input() {
    let app = app();

    let cases = [
        json!({ "name": "", "username": "alice", "password": "open sesame 1" }),
        json!({ "name": "Alice", "username": "  ", "password": "open sesame 1" }),
        json!({ "name": "Alice", "username": "a".repeat(31), "password": "open sesame 1" }),
        json!({ "name": "Alice", "username": "alice", "password": "short" }),
    ];
    for case in &cases {
        let (status, _) = post(&app, "/notes-api/users", None, case).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted bad body: {}", case);
    }
}

#[tokio::test]
async fn login_issues_a_three_segment_token() {
    let app = app();
    register(&app, "Alice", "alice", "open sesame 1").await;

    let token = login(&app, "alice", "open sesame 1").await;
    assert_eq!(token.split('.').count(), 3);
    assert!(token.starts_with("ey"));
}

#[tokio::test]
async fn login_with_unknown_username_is_not_found() {
    let app = app();

    let (status, body) = post(
        &app,
        "/notes-api/login",
        None,
        &json!({ "username": "nobody", "password": "whatever pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "There is no user with the provided username");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = app();
    register(&app, "Alice", "alice", "open sesame 1").await;

    let (status, body) = post(
        &app,
        "/notes-api/login",
        None,
        &json!({ "username": "alice", "password": "wrong password" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Bad credentials");
}

#[tokio::test]
async fn username_lookup_is_exact_match() {
    let app = app();
    register(&app, "Alice", "alice", "open sesame 1").await;

    let (status, _) = post(
        &app,
        "/notes-api/login",
        None,
        &json!({ "username": "Alice", "password": "open sesame 1" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn token_grants_access_to_protected_routes() {
    let app = app();
    register(&app, "Alice", "alice", "open sesame 1").await;
    let token = login(&app, "alice", "open sesame 1").await;

    let (status, body) = get(&app, "/notes-api/users", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
}
