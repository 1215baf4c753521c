use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::database::models::UserRole;
use crate::error::ApiError;
use crate::AppState;

/// Authenticated principal resolved from a bearer token and attached to
/// request extensions for the remainder of the request.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

/// Bearer-token authentication middleware, run once per request before the
/// authorization policy.
///
/// A missing header passes through untouched. An invalid token or unknown
/// subject is logged and swallowed; the request continues unauthenticated
/// and any rejection is left to the policy enforcement point. This
/// middleware never produces a 401 itself.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(value) = request.headers().get(header::AUTHORIZATION) {
        match resolve_principal(&state, value).await {
            Ok(principal) => {
                request.extensions_mut().insert(principal);
            }
            Err(reason) => {
                tracing::warn!("authentication error: {}", reason);
            }
        }
    }

    next.run(request).await
}

async fn resolve_principal(state: &AppState, value: &HeaderValue) -> Result<Principal, String> {
    let raw = value
        .to_str()
        .map_err(|_| "authorization header is not valid UTF-8".to_string())?;

    // Tolerate a missing scheme prefix; possession of a valid token is what
    // counts.
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw);

    let subject = state
        .tokens
        .parse_subject(token)
        .map_err(|e| e.to_string())?;

    let user = state
        .users
        .find_by_username(&subject)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("token subject \"{}\" does not exist", subject))?;

    Ok(Principal {
        user_id: user.id,
        username: user.username,
        role: user.role,
    })
}

// Handlers take Principal as an extractor; reaching one without an attached
// principal means the policy table let an unauthenticated request through.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
