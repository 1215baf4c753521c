pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenCodec;
use crate::database::store::{NoteStore, UserStore};
use crate::middleware::RoutePolicy;
use crate::services::VerificationService;

/// Shared per-process state: store handles, the token codec and the route
/// policy, all immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub notes: Arc<dyn NoteStore>,
    pub verification: VerificationService,
    pub tokens: Arc<TokenCodec>,
    pub policy: Arc<RoutePolicy>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        notes: Arc<dyn NoteStore>,
        tokens: Arc<TokenCodec>,
        policy: Arc<RoutePolicy>,
    ) -> Self {
        let verification = VerificationService::new(users.clone(), notes.clone());
        Self {
            users,
            notes,
            verification,
            tokens,
            policy,
        }
    }
}

/// Build the full router. Requests pass through the authenticator first,
/// then policy enforcement, then the handlers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(auth_routes())
        .merge(user_routes())
        .merge(note_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::policy::enforce,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use axum::routing::post;

    Router::new().route("/notes-api/login", post(handlers::auth::login))
}

fn user_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::users;

    Router::new().route(
        "/notes-api/users",
        post(users::register)
            .get(users::current)
            .put(users::update)
            .delete(users::delete),
    )
}

fn note_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::notes;

    Router::new()
        .route(
            "/notes-api/notes",
            post(notes::create).get(notes::find_all),
        )
        .route("/notes-api/notes/search/by-term", get(notes::find_by_term))
        .route("/notes-api/notes/search/by-tags", get(notes::find_by_tags))
        .route(
            "/notes-api/notes/:id",
            get(notes::find_by_id)
                .put(notes::update)
                .delete(notes::delete),
        )
}
