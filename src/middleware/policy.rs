//! Static route -> required-access table and its enforcement middleware.
//!
//! The table is consulted after [`super::authenticate`] has run:
//! unauthenticated access to a non-public route yields 401, authenticated
//! access without the required role yields 403.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::Profile;
use crate::database::models::UserRole;
use crate::error::ApiError;
use crate::middleware::auth::Principal;
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    AnyRole(&'static [UserRole]),
}

const ANY_USER: &[UserRole] = &[UserRole::Admin, UserRole::User];

#[derive(Debug)]
struct Rule {
    /// None matches every verb.
    method: Option<Method>,
    pattern: &'static str,
    access: Access,
}

/// Ordered rule table; the first matching rule wins, so public exceptions
/// must precede broader role rules for the same path.
#[derive(Debug)]
pub struct RoutePolicy {
    rules: Vec<Rule>,
    fallback: Access,
}

impl RoutePolicy {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Permissive => Self::permissive(),
            Profile::Strict => Self::strict(),
        }
    }

    /// Dev/test table: banner, health and docs routes are open, plus the
    /// login and registration POSTs. Everything else needs authentication.
    pub fn permissive() -> Self {
        Self {
            rules: vec![
                Rule { method: Some(Method::GET), pattern: "/", access: Access::Public },
                Rule { method: Some(Method::GET), pattern: "/health", access: Access::Public },
                Rule { method: None, pattern: "/docs/*", access: Access::Public },
                Rule { method: Some(Method::POST), pattern: "/notes-api/login", access: Access::Public },
                Rule { method: Some(Method::POST), pattern: "/notes-api/users", access: Access::Public },
            ],
            fallback: Access::Authenticated,
        }
    }

    /// Production table: only login and registration are public; user and
    /// note routes additionally require a known role.
    pub fn strict() -> Self {
        Self {
            rules: vec![
                Rule { method: Some(Method::POST), pattern: "/notes-api/login", access: Access::Public },
                Rule { method: Some(Method::POST), pattern: "/notes-api/users", access: Access::Public },
                Rule { method: None, pattern: "/notes-api/users", access: Access::AnyRole(ANY_USER) },
                Rule { method: None, pattern: "/notes-api/notes", access: Access::AnyRole(ANY_USER) },
                Rule { method: None, pattern: "/notes-api/notes/*", access: Access::AnyRole(ANY_USER) },
            ],
            fallback: Access::Authenticated,
        }
    }

    pub fn required_access(&self, method: &Method, path: &str) -> &Access {
        self.rules
            .iter()
            .find(|rule| {
                rule.method.as_ref().map_or(true, |m| m == method)
                    && pattern_matches(rule.pattern, path)
            })
            .map(|rule| &rule.access)
            .unwrap_or(&self.fallback)
    }
}

/// Exact match, or prefix match for patterns ending in `/*`.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(prefix) => path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/')),
        None => pattern == path,
    }
}

/// Enforcement point for the policy table.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let access = state.policy.required_access(request.method(), request.uri().path());
    let principal = request.extensions().get::<Principal>();

    match access {
        Access::Public => {}
        Access::Authenticated => {
            if principal.is_none() {
                return ApiError::unauthorized("Authentication required").into_response();
            }
        }
        Access::AnyRole(roles) => match principal {
            None => return ApiError::unauthorized("Authentication required").into_response(),
            Some(p) if !roles.contains(&p.role) => {
                return ApiError::forbidden("Insufficient role").into_response();
            }
            Some(_) => {}
        },
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_opens_docs_and_registration() {
        let policy = RoutePolicy::permissive();
        assert_eq!(policy.required_access(&Method::GET, "/"), &Access::Public);
        assert_eq!(policy.required_access(&Method::GET, "/health"), &Access::Public);
        assert_eq!(policy.required_access(&Method::GET, "/docs/openapi.json"), &Access::Public);
        assert_eq!(policy.required_access(&Method::POST, "/notes-api/login"), &Access::Public);
        assert_eq!(policy.required_access(&Method::POST, "/notes-api/users"), &Access::Public);
    }

    #[test]
    fn permissive_still_guards_notes() {
        let policy = RoutePolicy::permissive();
        assert_eq!(
            policy.required_access(&Method::GET, "/notes-api/notes"),
            &Access::Authenticated
        );
        assert_eq!(
            policy.required_access(&Method::DELETE, "/notes-api/users"),
            &Access::Authenticated
        );
    }

    #[test]
    fn strict_locks_down_everything_but_login_and_registration() {
        let policy = RoutePolicy::strict();
        assert_eq!(policy.required_access(&Method::POST, "/notes-api/login"), &Access::Public);
        assert_eq!(policy.required_access(&Method::POST, "/notes-api/users"), &Access::Public);
        assert_eq!(policy.required_access(&Method::GET, "/health"), &Access::Authenticated);
        assert_eq!(
            policy.required_access(&Method::GET, "/notes-api/notes/some-id"),
            &Access::AnyRole(ANY_USER)
        );
        assert_eq!(
            policy.required_access(&Method::PUT, "/notes-api/users"),
            &Access::AnyRole(ANY_USER)
        );
    }

    #[test]
    fn registration_exception_precedes_role_rule() {
        // POST /notes-api/users must stay public even though the broader
        // /notes-api/users rule requires a role
        let policy = RoutePolicy::strict();
        assert_eq!(policy.required_access(&Method::POST, "/notes-api/users"), &Access::Public);
        assert_ne!(policy.required_access(&Method::GET, "/notes-api/users"), &Access::Public);
    }

    #[test]
    fn wildcard_patterns_respect_segment_boundaries() {
        assert!(pattern_matches("/docs/*", "/docs"));
        assert!(pattern_matches("/docs/*", "/docs/api"));
        assert!(pattern_matches("/docs/*", "/docs/api/v3"));
        assert!(!pattern_matches("/docs/*", "/docsx"));
        assert!(!pattern_matches("/notes-api/notes", "/notes-api/notes/123"));
    }
}
