//! Shared helpers for driving the full router in-process.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use notes_api::auth::TokenCodec;
use notes_api::config::Profile;
use notes_api::database::MemoryStore;
use notes_api::middleware::RoutePolicy;
use notes_api::AppState;

/// Signing key shared with tests that hand-craft tokens.
pub const TOKEN_KEY: &str = "integration-test-signing-key";
pub const TOKEN_TTL_SECS: u64 = 3600;

pub fn app() -> Router {
    app_with_profile(Profile::Permissive)
}

pub fn app_with_profile(profile: Profile) -> Router {
    let store = Arc::new(MemoryStore::new());
    let tokens = Arc::new(TokenCodec::new(TOKEN_KEY, TOKEN_TTL_SECS).expect("codec"));
    let policy = Arc::new(RoutePolicy::for_profile(profile));

    notes_api::app(AppState::new(store.clone(), store, tokens, policy))
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Run one request through a clone of the router, returning status and the
/// parsed JSON body (Null for an empty body).
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, request(Method::GET, uri, token, None)).await
}

pub async fn post(app: &Router, uri: &str, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
    send(app, request(Method::POST, uri, token, Some(body))).await
}

pub async fn put(app: &Router, uri: &str, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
    send(app, request(Method::PUT, uri, token, Some(body))).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, request(Method::DELETE, uri, token, None)).await
}

/// Register an account and assert it was created.
pub async fn register(app: &Router, name: &str, username: &str, password: &str) -> Value {
    let (status, body) = post(
        app,
        "/notes-api/users",
        None,
        &json!({ "name": name, "username": username, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    body
}

/// Log in and return the issued bearer token.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = post(
        app,
        "/notes-api/login",
        None,
        &json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["data"]["token"].as_str().expect("token").to_string()
}

/// Register and log in a fresh account in one step.
pub async fn signed_up_user(app: &Router, username: &str) -> String {
    register(app, "Test User", username, "correct horse battery").await;
    login(app, username, "correct horse battery").await
}

/// Create a note and return its id.
pub async fn create_note(app: &Router, token: &str, tags: &[&str], title: &str, content: &str) -> String {
    let (status, body) = post(
        app,
        "/notes-api/notes",
        Some(token),
        &json!({ "tags": tags, "title": title, "content": content }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "note creation failed: {}", body);
    body["data"]["id"].as_str().expect("note id").to_string()
}
