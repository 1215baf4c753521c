use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::password;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /notes-api/login - authenticate and issue a bearer token.
///
/// An unknown username fails the existence guard (404) before any
/// credential comparison happens; a wrong password for a known user is 401.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    state.verification.verify_user_exists(&body.username).await?;

    let user = state
        .users
        .find_by_username(&body.username)
        .await?
        .ok_or_else(|| ApiError::not_found("There is no user with the provided username"))?;

    if !password::verify(&body.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Bad credentials"));
    }

    let token = state.tokens.issue(&user.username)?;
    tracing::info!(username = %user.username, "issued token");

    Ok(Json(json!({
        "success": true,
        "data": { "token": token }
    })))
}
