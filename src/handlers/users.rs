use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::password;
use crate::database::models::{User, UserRole};
use crate::error::ApiError;
use crate::middleware::Principal;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// The password never appears here, hashed or plain.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub role: UserRole,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

const USERNAME_MAX: usize = 30;
const PASSWORD_MIN: usize = 8;

fn validate(body: &UserRequest) -> Result<(), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name must not be blank"));
    }
    if body.username.trim().is_empty() {
        return Err(ApiError::bad_request("Username must not be blank"));
    }
    if body.username.len() > USERNAME_MAX {
        return Err(ApiError::bad_request(format!(
            "Username must be at most {} characters",
            USERNAME_MAX
        )));
    }
    if body.password.len() < PASSWORD_MIN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN
        )));
    }
    Ok(())
}

/// POST /notes-api/users - register a new account. Role defaults to USER.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<UserRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.verification.verify_username_free(&body.username).await?;
    validate(&body)?;

    let hash = password::hash(&body.password)?;
    let user = state
        .users
        .save(User::new(body.name, body.username, hash))
        .await?;
    tracing::info!(username = %user.username, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": UserResponse::from(&user) })),
    ))
}

/// GET /notes-api/users - the logged-in user's details.
pub async fn current(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, ApiError> {
    let user = super::current_user(&state, &principal).await?;

    Ok(Json(json!({ "success": true, "data": UserResponse::from(&user) })))
}

/// PUT /notes-api/users - update name, username and password.
///
/// The username-free guard runs against the requested username before
/// anything else, so re-submitting the current username is a conflict, and
/// tokens issued for the old username keep their original expiry but stop
/// resolving to a user. Both behaviors are inherited and deliberate.
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<UserRequest>,
) -> Result<Json<Value>, ApiError> {
    state.verification.verify_username_free(&body.username).await?;
    validate(&body)?;

    let mut user = super::current_user(&state, &principal).await?;
    user.name = body.name;
    user.username = body.username;
    user.password_hash = password::hash(&body.password)?;
    let user = state.users.save(user).await?;
    tracing::info!(username = %user.username, "updated user profile");

    Ok(Json(json!({ "success": true, "data": UserResponse::from(&user) })))
}

/// DELETE /notes-api/users - delete the account and every owned note.
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, ApiError> {
    let user = super::current_user(&state, &principal).await?;

    // Notes first so a failure between the two deletes never leaves
    // orphaned notes behind an already-deleted owner.
    state.notes.delete_by_user(user.id).await?;
    state.users.delete_by_id(user.id).await?;
    tracing::info!(username = %user.username, "deleted account");

    Ok(Json(json!({
        "success": true,
        "data": "Your account was deleted successfully"
    })))
}
