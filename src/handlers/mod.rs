pub mod auth;
pub mod notes;
pub mod users;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::Principal;
use crate::AppState;

/// Re-resolve the authenticated principal to a full user row. The existence
/// guard runs first so a user deleted mid-session surfaces as 404 instead of
/// an unwrap on a missing row.
pub(crate) async fn current_user(state: &AppState, principal: &Principal) -> Result<User, ApiError> {
    state.verification.verify_user_exists(&principal.username).await?;

    state
        .users
        .find_by_username(&principal.username)
        .await?
        .ok_or_else(|| ApiError::not_found("There is no user with the provided username"))
}

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Notes API",
            "version": version,
            "endpoints": {
                "login": "POST /notes-api/login (public)",
                "users": "/notes-api/users (POST public, GET/PUT/DELETE authenticated)",
                "notes": "/notes-api/notes[/:id] (authenticated)",
                "search": "/notes-api/notes/search/{by-term,by-tags} (authenticated)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.users.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": { "status": "degraded", "timestamp": now, "store_error": e.to_string() }
            })),
        ),
    }
}
